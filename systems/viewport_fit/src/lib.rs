#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Viewport fitting applied to generated formations before they spawn.
//!
//! Formations are laid out at a canonical size around an origin that knows
//! nothing about the screen. [`fit`] post-processes them against the current
//! [`Viewport`] in three passes: an optional uniform scale so the formation
//! is at most 60% of the viewport wide, a translation away from the
//! horizontal screen centre, and a minimal translation that keeps the
//! formation inside the horizontal margins and above the top edge.

mod origin;

pub use origin::{spawn_origin, SpawnSide};

use space_shooter_core::{Position, Vec2, Viewport};

/// Largest formation width allowed, as a fraction of the viewport width.
pub const MAX_WIDTH_FRACTION: f32 = 0.6;
/// Lower edge of the forbidden centre band in viewport space.
pub const CENTER_BAND_LOW: f32 = 0.4;
/// Upper edge of the forbidden centre band in viewport space.
pub const CENTER_BAND_HIGH: f32 = 0.6;
/// Clearance kept between a displaced formation and the centre band.
pub const CENTER_BAND_CLEARANCE: f32 = 0.15;
/// Horizontal margin kept on both sides of the viewport.
pub const MARGIN_X: f32 = 0.15;
/// Lowest normalised height allowed; 1.0 is the visible top edge.
pub const MIN_Y: f32 = 1.0;

const TOLERANCE: f32 = 1e-4;

/// Fits `positions` into `viewport`, returning the adjusted formation.
///
/// Only uniform transformations are applied, so the formation keeps its
/// shape. Fitting is idempotent: running it again on its own output
/// changes nothing beyond floating point noise. Empty input and degenerate
/// viewports are returned unchanged.
#[must_use]
pub fn fit(positions: &[Position], viewport: &Viewport) -> Vec<Position> {
    let mut fitted = positions.to_vec();
    if fitted.is_empty() || viewport.is_degenerate() {
        return fitted;
    }

    scale_to_fit(&mut fitted, viewport);
    avoid_center(&mut fitted, viewport);
    clamp_to_bounds(&mut fitted, viewport);
    fitted
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
    min: Vec2,
    max: Vec2,
}

impl Bounds {
    fn enclosing(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, point| Self {
                min: bounds.min.min(point),
                max: bounds.max.max(point),
            },
        ))
    }

    fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

fn normalized_bounds(positions: &[Position], viewport: &Viewport) -> Option<Bounds> {
    Bounds::enclosing(positions.iter().map(|position| viewport.normalize(*position)))
}

fn translate(positions: &mut [Position], offset: Vec2) {
    for position in positions {
        *position += offset;
    }
}

fn in_center_band(normalized_x: f32) -> bool {
    (CENTER_BAND_LOW..=CENTER_BAND_HIGH).contains(&normalized_x)
}

fn scale_to_fit(positions: &mut [Position], viewport: &Viewport) {
    let Some(bounds) = Bounds::enclosing(positions.iter().copied()) else {
        return;
    };

    let allowed = viewport.width() * MAX_WIDTH_FRACTION;
    let width = bounds.width();
    if width <= allowed * (1.0 + TOLERANCE) {
        return;
    }

    let factor = allowed / width;
    let center = bounds.center();
    log::debug!("scaling formation by {factor:.3} to fit {allowed:.2} world units");
    for position in positions.iter_mut() {
        *position = center + (*position - center) * factor;
    }
}

/// Moves the whole formation sideways when any member sits in the centre band.
///
/// A formation narrow enough to fit between the margin and the band is moved
/// to the side of its first member with its band-facing edge a clearance
/// beyond the band. Wider formations cannot clear the band and are pushed
/// against the outer margin on the side holding most of their extent.
fn avoid_center(positions: &mut [Position], viewport: &Viewport) {
    let Some(first) = positions.first().map(|position| viewport.normalize(*position)) else {
        return;
    };
    if !positions
        .iter()
        .any(|position| in_center_band(viewport.normalize(*position).x))
    {
        return;
    }
    let Some(bounds) = normalized_bounds(positions, viewport) else {
        return;
    };

    let first_on_left = first.x < 0.5;
    let room_beside_band = CENTER_BAND_LOW - MARGIN_X;
    let shift = if bounds.width() + TOLERANCE < room_beside_band {
        if first_on_left {
            (CENTER_BAND_LOW - CENTER_BAND_CLEARANCE) - bounds.max.x
        } else {
            (CENTER_BAND_HIGH + CENTER_BAND_CLEARANCE) - bounds.min.x
        }
    } else {
        let center = bounds.center().x;
        let push_left = if (center - 0.5).abs() <= TOLERANCE {
            first_on_left
        } else {
            center < 0.5
        };
        if push_left {
            MARGIN_X - bounds.min.x
        } else {
            (1.0 - MARGIN_X) - bounds.max.x
        }
    };

    log::debug!("shifting formation {shift:+.3} viewport widths away from the centre band");
    translate(positions, Vec2::new(shift * viewport.width(), 0.0));
}

fn clamp_to_bounds(positions: &mut [Position], viewport: &Viewport) {
    let Some(bounds) = normalized_bounds(positions, viewport) else {
        return;
    };

    let mut offset = Vec2::ZERO;
    if bounds.min.x < MARGIN_X - TOLERANCE {
        offset.x = MARGIN_X - bounds.min.x;
    } else if bounds.max.x > 1.0 - MARGIN_X + TOLERANCE {
        offset.x = (1.0 - MARGIN_X) - bounds.max.x;
    }
    if bounds.min.y < MIN_Y - TOLERANCE {
        offset.y = MIN_Y - bounds.min.y;
    }

    if offset != Vec2::ZERO {
        translate(
            positions,
            Vec2::new(offset.x * viewport.width(), offset.y * viewport.height()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(-5.0, 5.0, -5.0, 5.0)
    }

    fn offsets(positions: &[Position]) -> Vec<Vec2> {
        positions.iter().map(|position| *position - positions[0]).collect()
    }

    fn band_members(positions: &[Position], viewport: &Viewport) -> usize {
        positions
            .iter()
            .filter(|position| in_center_band(viewport.normalize(**position).x))
            .count()
    }

    #[test]
    fn narrow_formation_moves_toward_first_member_side() {
        let viewport = viewport();
        let mut positions = vec![Vec2::new(-0.5, 6.0), Vec2::new(0.5, 6.0)];
        avoid_center(&mut positions, &viewport);

        let right_edge = viewport.normalize(positions[1]).x;
        assert!((right_edge - 0.25).abs() < 1e-5);
        assert_eq!(band_members(&positions, &viewport), 0);
    }

    #[test]
    fn narrow_formation_starting_right_moves_right() {
        let viewport = viewport();
        let mut positions = vec![Vec2::new(0.5, 6.0), Vec2::new(-0.5, 6.0)];
        avoid_center(&mut positions, &viewport);

        let left_edge = viewport.normalize(positions[1]).x;
        assert!((left_edge - 0.75).abs() < 1e-5);
    }

    #[test]
    fn centre_avoidance_is_a_pure_translation() {
        let viewport = viewport();
        let original = vec![
            Vec2::new(-1.0, 6.0),
            Vec2::new(0.0, 7.0),
            Vec2::new(2.5, 5.5),
            Vec2::new(0.3, 6.2),
        ];
        let mut moved = original.clone();
        avoid_center(&mut moved, &viewport);

        for (before, after) in offsets(&original).iter().zip(offsets(&moved)) {
            assert!((*before - after).length() < 1e-5);
        }
        assert!(band_members(&moved, &viewport) <= band_members(&original, &viewport));
    }

    #[test]
    fn formations_clear_of_the_band_are_left_alone() {
        let viewport = viewport();
        let original = vec![Vec2::new(-3.0, 6.0), Vec2::new(-2.0, 6.0)];
        let mut moved = original.clone();
        avoid_center(&mut moved, &viewport);
        assert_eq!(moved, original);
    }

    #[test]
    fn wide_formation_is_pushed_against_the_margin() {
        let viewport = viewport();
        let mut positions = vec![
            Vec2::new(1.5, 6.0),
            Vec2::new(-2.5, 6.0),
            Vec2::new(0.0, 6.0),
        ];
        avoid_center(&mut positions, &viewport);

        let bounds = normalized_bounds(&positions, &viewport).expect("bounds");
        assert!((bounds.min.x - MARGIN_X).abs() < 1e-5);
    }

    #[test]
    fn scaling_preserves_shape_about_the_centre() {
        let viewport = viewport();
        let mut positions = vec![Vec2::new(-6.0, 0.0), Vec2::new(6.0, 2.0)];
        scale_to_fit(&mut positions, &viewport);

        assert!((positions[1].x - positions[0].x - 6.0).abs() < 1e-5);
        assert!((positions[1].y - positions[0].y - 1.0).abs() < 1e-5);
        assert!(((positions[0] + positions[1]) * 0.5 - Vec2::new(0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn clamp_lifts_formation_above_the_top_edge() {
        let viewport = viewport();
        let mut positions = vec![Vec2::new(-4.9, 0.0), Vec2::new(-3.9, 2.0)];
        clamp_to_bounds(&mut positions, &viewport);

        let bounds = normalized_bounds(&positions, &viewport).expect("bounds");
        assert!((bounds.min.x - MARGIN_X).abs() < 1e-5);
        assert!((bounds.min.y - MIN_Y).abs() < 1e-5);
    }
}
