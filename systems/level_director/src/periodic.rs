use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use space_shooter_core::{
    Command, Diagnostic, Motion, PeriodicKind, PeriodicSpawn, Position, SpawnRequest, TemplateId,
    Vec2, Viewport,
};

/// Horizontal inset from each viewport edge for periodic spawns.
const EDGE_INSET: f32 = 1.0;
/// Height above the viewport centre at which periodic spawns appear.
const SPAWN_LIFT: f32 = 1.0;
/// Distance below the viewport bottom at which bodies remove themselves.
const BODY_FLOOR_DEPTH: f32 = 5.0;

/// Independent spawner firing every `interval` for the life of the level.
#[derive(Debug)]
pub(crate) struct PeriodicSpawner {
    kind: PeriodicKind,
    templates: Vec<TemplateId>,
    interval: Duration,
    speed: f32,
    next_fire: Duration,
}

impl PeriodicSpawner {
    /// Validates `spec` and schedules the first firing relative to `started_at`.
    pub(crate) fn new(
        kind: PeriodicKind,
        spec: &PeriodicSpawn,
        started_at: Duration,
    ) -> Result<Self, Diagnostic> {
        if spec.interval.is_zero() {
            return Err(Diagnostic::SpawnerDisabled {
                kind,
                cause: "interval is zero",
            });
        }
        if spec.templates.is_empty() {
            return Err(Diagnostic::SpawnerDisabled {
                kind,
                cause: "no templates configured",
            });
        }

        Ok(Self {
            kind,
            templates: spec.templates.clone(),
            interval: spec.interval,
            speed: spec.speed,
            next_fire: started_at
                .saturating_add(spec.warm_up)
                .saturating_add(spec.interval),
        })
    }

    /// Timestamp of the next firing.
    pub(crate) fn next_fire(&self) -> Duration {
        self.next_fire
    }

    /// Consumes the due firing without spawning anything.
    pub(crate) fn skip(&mut self) {
        log::debug!("{} spawn skipped: no player present", self.kind);
        self.next_fire = self.next_fire.saturating_add(self.interval);
    }

    /// Spawns one entity for the due firing and schedules the next one.
    pub(crate) fn fire(
        &mut self,
        viewport: &Viewport,
        rng: &mut ChaCha8Rng,
        out: &mut Vec<Command>,
    ) {
        self.next_fire = self.next_fire.saturating_add(self.interval);

        let index = rng.gen_range(0..self.templates.len());
        let template = self.templates[index].clone();
        let position = spawn_position(viewport, rng);
        log::debug!(
            "{} spawner fires {template} at ({:.2}, {:.2})",
            self.kind,
            position.x,
            position.y
        );
        out.push(Command::SpawnEntity {
            request: SpawnRequest {
                template,
                position,
                rotation: 0.0,
                motion: self.motion(viewport),
                wave: None,
            },
        });
    }

    fn motion(&self, viewport: &Viewport) -> Motion {
        match self.kind {
            PeriodicKind::Pickup => Motion::StraightDown { speed: self.speed },
            PeriodicKind::Body => Motion::SinkBelow {
                speed: self.speed,
                floor_y: viewport.min_y() - BODY_FLOOR_DEPTH,
            },
        }
    }
}

fn spawn_position(viewport: &Viewport, rng: &mut ChaCha8Rng) -> Position {
    let low = viewport.min_x() + EDGE_INSET;
    let high = viewport.max_x() - EDGE_INSET;
    let x = if low < high {
        rng.gen_range(low..high)
    } else {
        viewport.center().x
    };
    Vec2::new(x, viewport.center().y + SPAWN_LIFT)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn pickups(interval: Duration) -> PeriodicSpawn {
        PeriodicSpawn {
            interval,
            ..PeriodicSpawn::pickups(vec![TemplateId::new("shield")])
        }
    }

    #[test]
    fn zero_interval_and_empty_templates_disable_the_spawner() {
        assert_eq!(
            PeriodicSpawner::new(PeriodicKind::Pickup, &pickups(Duration::ZERO), Duration::ZERO)
                .err(),
            Some(Diagnostic::SpawnerDisabled {
                kind: PeriodicKind::Pickup,
                cause: "interval is zero",
            })
        );
        assert!(PeriodicSpawner::new(
            PeriodicKind::Body,
            &PeriodicSpawn::bodies(Vec::new()),
            Duration::ZERO
        )
        .is_err());
    }

    #[test]
    fn positions_stay_inside_the_inset_viewport() {
        let viewport = Viewport::new(-4.0, 4.0, -6.0, 6.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..64 {
            let position = spawn_position(&viewport, &mut rng);
            assert!((-3.0..3.0).contains(&position.x));
            assert!((position.y - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn narrow_viewports_spawn_at_the_centre() {
        let viewport = Viewport::new(9.0, 10.5, 0.0, 4.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let position = spawn_position(&viewport, &mut rng);
        assert_eq!(position, Vec2::new(9.75, 3.0));
    }

    #[test]
    fn firings_are_spaced_by_the_interval_after_warm_up() {
        let spec = PeriodicSpawn {
            warm_up: Duration::from_secs(10),
            ..pickups(Duration::from_secs(2))
        };
        let mut spawner =
            PeriodicSpawner::new(PeriodicKind::Pickup, &spec, Duration::from_secs(1))
                .expect("spawner");
        assert_eq!(spawner.next_fire(), Duration::from_secs(13));

        spawner.skip();
        assert_eq!(spawner.next_fire(), Duration::from_secs(15));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut out = Vec::new();
        spawner.fire(&Viewport::FALLBACK, &mut rng, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(spawner.next_fire(), Duration::from_secs(17));
    }

    #[test]
    fn bodies_sink_below_the_viewport() {
        let mut spawner = PeriodicSpawner::new(
            PeriodicKind::Body,
            &PeriodicSpawn::bodies(vec![TemplateId::new("planet")]),
            Duration::ZERO,
        )
        .expect("spawner");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut out = Vec::new();

        spawner.fire(&Viewport::FALLBACK, &mut rng, &mut out);
        match out.as_slice() {
            [Command::SpawnEntity { request }] => assert_eq!(
                request.motion,
                Motion::SinkBelow {
                    speed: 3.0,
                    floor_y: -10.0,
                }
            ),
            other => panic!("unexpected commands {other:?}"),
        }
    }
}
