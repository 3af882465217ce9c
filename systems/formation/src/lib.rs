#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure formation generator that lays out enemy spawn positions.
//!
//! Every layout is computed relative to a caller-supplied origin. Random
//! choices such as the spawn side are made by the caller before invoking
//! [`generate`], which keeps the generator deterministic.

use std::f32::consts::TAU;

use space_shooter_core::{FormationKind, FormationSpec, Position, Vec2};

/// Computes the spawn positions described by `spec` around `origin`.
///
/// The returned sequence is in spawn order and always holds exactly
/// `spec.count` positions; a count of zero yields an empty sequence that the
/// caller should treat as a no-op. Non-positive spacing, radius or extents
/// are accepted and simply collapse the shape.
#[must_use]
pub fn generate(spec: &FormationSpec, origin: Position) -> Vec<Position> {
    let count = spec.count as usize;
    if count == 0 {
        return Vec::new();
    }

    let positions = match spec.kind {
        FormationKind::Straight => straight(count, spec.spacing, origin),
        FormationKind::V => v_shape(count, spec.spacing, spec.height, origin),
        FormationKind::Heart => heart(count, spec.spacing, origin),
        FormationKind::Bow => bow(count, spec.width, spec.height, origin),
        FormationKind::Diamond => diamond(count, spec.spacing, origin),
        FormationKind::Circle => circle(count, spec.radius, origin),
        FormationKind::MultipleRows => rows(count, spec.rows, spec.spacing, false, origin),
        FormationKind::Rhombus => rhombus(count, spec.spacing, origin),
        FormationKind::ZigZag => rows(count, spec.rows, spec.spacing, true, origin),
    };

    debug_assert_eq!(positions.len(), count, "formation length mismatch");
    positions
}

/// Offset of column `col` in a row of `width` slots centred on zero.
fn centered(col: usize, width: usize) -> f32 {
    col as f32 - (width as f32 - 1.0) / 2.0
}

fn straight(count: usize, spacing: f32, origin: Position) -> Vec<Position> {
    (0..count)
        .map(|index| Vec2::new(origin.x + centered(index, count) * spacing, origin.y))
        .collect()
}

fn v_shape(count: usize, spacing: f32, height: f32, origin: Position) -> Vec<Position> {
    let apex = count / 2;
    let drop_per_step = height / apex.max(1) as f32;
    (0..count)
        .map(|index| {
            let offset = index as f32 - apex as f32;
            let depth = index.abs_diff(apex) as f32;
            Vec2::new(
                origin.x + offset * spacing,
                origin.y - depth * drop_per_step,
            )
        })
        .collect()
}

fn heart(count: usize, spacing: f32, origin: Position) -> Vec<Position> {
    let mut positions = Vec::with_capacity(count);

    for lobe in [-0.7, 0.7] {
        if positions.len() < count {
            positions.push(origin + Vec2::new(lobe * spacing, 1.2 * spacing));
        }
    }

    let middle = (count - positions.len()).min((count / 3).max(3));
    push_row(
        &mut positions,
        middle,
        middle,
        0.8 * spacing,
        0.3 * spacing,
        origin,
    );

    // The lower row is one narrower than what is left so that the tip gets a point.
    let remaining = count - positions.len();
    let lower_width = remaining.saturating_sub(1).max(2);
    push_row(
        &mut positions,
        remaining.min(lower_width),
        lower_width,
        0.7 * spacing,
        -0.5 * spacing,
        origin,
    );

    while positions.len() < count {
        positions.push(origin + Vec2::new(0.0, -1.2 * spacing));
    }

    positions
}

fn push_row(
    positions: &mut Vec<Position>,
    placed: usize,
    width: usize,
    step: f32,
    y_offset: f32,
    origin: Position,
) {
    for col in 0..placed {
        positions.push(origin + Vec2::new(centered(col, width) * step, y_offset));
    }
}

fn bow(count: usize, width: f32, height: f32, origin: Position) -> Vec<Position> {
    let last = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|index| {
            let t = index as f32 / last;
            let u = 2.0 * t - 1.0;
            Vec2::new(origin.x + u * width / 2.0, origin.y - u * u * height)
        })
        .collect()
}

/// Rows of width 1, 3, 5, ... up to the middle row, then shrinking back to 1.
///
/// The middle row index `m` is the smallest value whose full diamond
/// (`2m² + 2m + 1` positions) can hold `count`. Placement stops as soon as
/// `count` positions exist, so small counts leave the lower half incomplete.
fn diamond(count: usize, spacing: f32, origin: Position) -> Vec<Position> {
    let mut middle = 0usize;
    while 2 * middle * middle + 2 * middle + 1 < count {
        middle += 1;
    }

    let mut positions = Vec::with_capacity(count);
    for row in 0..=2 * middle {
        let width = 2 * (middle - row.abs_diff(middle)) + 1;
        let y = origin.y + (middle as f32 - row as f32) * spacing;
        for col in 0..width {
            if positions.len() == count {
                return positions;
            }
            positions.push(Vec2::new(origin.x + centered(col, width) * spacing, y));
        }
    }
    positions
}

fn circle(count: usize, radius: f32, origin: Position) -> Vec<Position> {
    (0..count)
        .map(|index| {
            let angle = index as f32 / count as f32 * TAU;
            origin + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Grid of `rows` rows holding `ceil(count / rows)` columns each.
///
/// Columns share the same centred slots in every row, so a partially filled
/// last row stays aligned with the rows above it. `staggered` shifts odd rows
/// right by half a spacing.
fn rows(count: usize, rows: u32, spacing: f32, staggered: bool, origin: Position) -> Vec<Position> {
    let rows = (rows as usize).max(1);
    let per_row = (count + rows - 1) / rows;

    (0..count)
        .map(|index| {
            let row = index / per_row;
            let col = index % per_row;
            let mut x = origin.x + centered(col, per_row) * spacing;
            if staggered && row % 2 == 1 {
                x += spacing * 0.5;
            }
            Vec2::new(x, origin.y - row as f32 * spacing)
        })
        .collect()
}

/// Rhombus with side `s = ceil(sqrt(count))`: row widths 1, 2, ..., s, ..., 2, 1.
///
/// The middle row is `s - 1` and the full shape holds `s²` positions, which
/// is always enough for `count`.
fn rhombus(count: usize, spacing: f32, origin: Position) -> Vec<Position> {
    let mut side = 1usize;
    while side * side < count {
        side += 1;
    }
    let middle = side - 1;

    let mut positions = Vec::with_capacity(count);
    for row in 0..2 * side - 1 {
        let width = side - row.abs_diff(middle);
        let y = origin.y + (middle as f32 - row as f32) * spacing;
        for col in 0..width {
            if positions.len() == count {
                return positions;
            }
            positions.push(Vec2::new(origin.x + centered(col, width) * spacing, y));
        }
    }
    positions
}
