use space_shooter_core::{FormationKind, FormationSpec, Position, Vec2, Viewport};
use space_shooter_system_formation::generate;
use space_shooter_system_viewport_fit::{
    fit, spawn_origin, SpawnSide, CENTER_BAND_HIGH, CENTER_BAND_LOW, MARGIN_X,
    MAX_WIDTH_FRACTION, MIN_Y,
};

const TOLERANCE: f32 = 1e-4;

fn viewports() -> Vec<Viewport> {
    vec![
        Viewport::FALLBACK,
        Viewport::new(-8.9, 8.9, -5.0, 5.0),
        Viewport::new(10.0, 14.0, 100.0, 112.0),
    ]
}

fn formations(viewport: &Viewport) -> Vec<Vec<Position>> {
    let mut all = Vec::new();
    for kind in FormationKind::ALL {
        for count in [1, 2, 5, 9, 16] {
            for side in [SpawnSide::Left, SpawnSide::Right] {
                for t in [0.0, 0.5, 1.0] {
                    let origin = spawn_origin(viewport, side, t);
                    all.push(generate(&FormationSpec::new(kind, count), origin));
                }
            }
        }
    }
    all
}

fn assert_close(a: &[Position], b: &[Position]) {
    assert_eq!(a.len(), b.len());
    for (left, right) in a.iter().zip(b) {
        assert!(
            (*left - *right).length() < TOLERANCE,
            "positions diverged: {left} vs {right}"
        );
    }
}

#[test]
fn fitting_is_idempotent() {
    for viewport in viewports() {
        for formation in formations(&viewport) {
            let once = fit(&formation, &viewport);
            let twice = fit(&once, &viewport);
            assert_close(&once, &twice);
        }
    }
}

#[test]
fn fitted_formations_respect_width_margins_and_top_edge() {
    for viewport in viewports() {
        for formation in formations(&viewport) {
            let fitted = fit(&formation, &viewport);
            let normalized: Vec<Vec2> = fitted.iter().map(|p| viewport.normalize(*p)).collect();

            let min_x = normalized.iter().map(|n| n.x).fold(f32::INFINITY, f32::min);
            let max_x = normalized.iter().map(|n| n.x).fold(f32::NEG_INFINITY, f32::max);
            let min_y = normalized.iter().map(|n| n.y).fold(f32::INFINITY, f32::min);

            assert!(max_x - min_x <= MAX_WIDTH_FRACTION + TOLERANCE);
            assert!(min_x >= MARGIN_X - TOLERANCE, "min x {min_x}");
            assert!(max_x <= 1.0 - MARGIN_X + TOLERANCE, "max x {max_x}");
            assert!(min_y >= MIN_Y - TOLERANCE, "min y {min_y}");
        }
    }
}

#[test]
fn narrow_formations_never_touch_the_centre_band() {
    let viewport = Viewport::new(-5.0, 5.0, -5.0, 5.0);
    for side in [SpawnSide::Left, SpawnSide::Right] {
        let origin = spawn_origin(&viewport, side, 0.5);
        for kind in [FormationKind::Straight, FormationKind::Circle, FormationKind::Diamond] {
            let formation = generate(&FormationSpec::new(kind, 1), origin);
            let fitted = fit(&formation, &viewport);
            for position in fitted {
                let x = viewport.normalize(position).x;
                assert!(!(CENTER_BAND_LOW..=CENTER_BAND_HIGH).contains(&x));
            }
        }
    }

    let centred = vec![Vec2::new(0.0, 6.0), Vec2::new(0.5, 6.5), Vec2::new(-0.5, 6.5)];
    let fitted = fit(&centred, &viewport);
    for position in fitted {
        let x = viewport.normalize(position).x;
        assert!(!(CENTER_BAND_LOW..=CENTER_BAND_HIGH).contains(&x), "x {x}");
    }
}

#[test]
fn fitting_only_translates_formations_that_already_fit() {
    let viewport = Viewport::new(-5.0, 5.0, -5.0, 5.0);
    let formation = generate(
        &FormationSpec::new(FormationKind::V, 5),
        Vec2::new(0.0, 6.0),
    );
    let fitted = fit(&formation, &viewport);

    let delta = fitted[0] - formation[0];
    for (before, after) in formation.iter().zip(&fitted) {
        assert!(((*after - *before) - delta).length() < TOLERANCE);
    }
}

#[test]
fn oversized_formations_are_scaled_down() {
    let viewport = Viewport::new(-5.0, 5.0, -5.0, 5.0);
    let mut spec = FormationSpec::new(FormationKind::Straight, 21);
    spec.spacing = 1.0;
    let formation = generate(&spec, Vec2::new(0.0, 6.0));
    let fitted = fit(&formation, &viewport);

    let width = fitted[20].x - fitted[0].x;
    assert!((width - 6.0).abs() < TOLERANCE);
}

#[test]
fn empty_input_and_degenerate_viewports_pass_through() {
    assert!(fit(&[], &Viewport::FALLBACK).is_empty());

    let formation = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
    let degenerate = Viewport::new(0.0, 0.0, 0.0, 0.0);
    assert_eq!(fit(&formation, &degenerate), formation);
}
