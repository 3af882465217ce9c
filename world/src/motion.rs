use std::f32::consts::FRAC_PI_2;

use space_shooter_core::{Position, RemovalReason, Vec2};

/// Distance at which a path follower counts a waypoint as reached.
pub(crate) const ARRIVAL_RADIUS: f32 = 0.1;
/// Distance below the viewport bottom at which straight-down movers are culled.
pub(crate) const CULL_MARGIN: f32 = 2.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Movement {
    StraightDown {
        speed: f32,
    },
    PathFollow {
        points: Vec<Position>,
        next: usize,
        speed: f32,
        rotate_along_path: bool,
    },
    SinkBelow {
        speed: f32,
        floor_y: f32,
    },
}

/// Mutable kinematic state integrated once per tick.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pose {
    pub(crate) position: Position,
    pub(crate) rotation: f32,
}

impl Movement {
    /// Advances `pose` by `dt` seconds, returning why the entity should leave the world.
    pub(crate) fn integrate(
        &mut self,
        pose: &mut Pose,
        dt: f32,
        viewport_bottom: f32,
    ) -> Option<RemovalReason> {
        match self {
            Self::StraightDown { speed } => {
                pose.position.y -= *speed * dt;
                (pose.position.y < viewport_bottom - CULL_MARGIN)
                    .then_some(RemovalReason::LeftViewport)
            }
            Self::SinkBelow { speed, floor_y } => {
                pose.position.y -= *speed * dt;
                (pose.position.y < *floor_y).then_some(RemovalReason::SankBelowFloor)
            }
            Self::PathFollow {
                points,
                next,
                speed,
                rotate_along_path,
            } => {
                let mut budget = (*speed * dt).max(0.0);
                while let Some(target) = points.get(*next).copied() {
                    let offset = target - pose.position;
                    if *rotate_along_path && offset.length_squared() > f32::EPSILON {
                        pose.rotation = facing(offset);
                    }

                    pose.position = move_towards(pose.position, target, budget);
                    budget = (budget - offset.length()).max(0.0);
                    if pose.position.distance(target) >= ARRIVAL_RADIUS {
                        return None;
                    }
                    *next += 1;
                    if budget <= 0.0 {
                        break;
                    }
                }
                (*next >= points.len()).then_some(RemovalReason::PathCompleted)
            }
        }
    }
}

/// Rotation that points a sprite drawn facing up along `direction`.
pub(crate) fn facing(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x) - FRAC_PI_2
}

fn move_towards(from: Position, to: Position, max_distance: f32) -> Position {
    let offset = to - from;
    let distance = offset.length();
    if distance <= max_distance || distance <= f32::EPSILON {
        to
    } else {
        from + offset / distance * max_distance
    }
}
