use space_shooter_core::{Position, Vec2, Viewport};

const LEFT_RANGE: (f32, f32) = (0.2, 0.35);
const RIGHT_RANGE: (f32, f32) = (0.65, 0.8);
const SPAWN_HEIGHT: f32 = 1.15;

/// Side of the screen a formation spawns on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnSide {
    /// Left of the centre band.
    Left,
    /// Right of the centre band.
    Right,
}

impl SpawnSide {
    const fn range(self) -> (f32, f32) {
        match self {
            Self::Left => LEFT_RANGE,
            Self::Right => RIGHT_RANGE,
        }
    }
}

/// Canonical formation origin above the visible top edge on `side`.
///
/// `t` in `[0, 1]` selects the horizontal position within the side's lane;
/// callers draw it at random. Values outside the range are clamped.
#[must_use]
pub fn spawn_origin(viewport: &Viewport, side: SpawnSide, t: f32) -> Position {
    let (low, high) = side.range();
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    viewport.denormalize(Vec2::new(low + (high - low) * t, SPAWN_HEIGHT))
}
