#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that turns a fitted formation into timed spawn commands.

use std::{collections::VecDeque, time::Duration};

use space_shooter_core::{
    Command, Diagnostic, Motion, Position, SpawnRequest, WaveDefinition, WaveId,
};

/// Spawn request due a fixed offset after its wave starts.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedSpawn {
    /// Delay between the wave start and this spawn.
    pub offset: Duration,
    /// Entity to create once the offset elapses.
    pub request: SpawnRequest,
}

/// Plans one spawn per position, `spawn_interval` apart, in position order.
///
/// Enemies follow the wave's path when it has one and otherwise fly straight
/// down. A wave without a template or without positions cannot be scheduled.
pub fn schedule_wave(
    wave: WaveId,
    definition: &WaveDefinition,
    positions: &[Position],
) -> Result<Vec<TimedSpawn>, Diagnostic> {
    let Some(template) = definition.template.as_ref() else {
        return Err(Diagnostic::MissingTemplate { wave });
    };
    if positions.is_empty() {
        return Err(Diagnostic::EmptyFormation { wave });
    }

    let motion = if definition.path_points.is_empty() {
        Motion::StraightDown {
            speed: definition.speed,
        }
    } else {
        Motion::PathFollow {
            points: definition.path_points.clone(),
            speed: definition.speed,
            rotate_along_path: definition.rotate_along_path,
        }
    };

    Ok(positions
        .iter()
        .enumerate()
        .map(|(index, position)| TimedSpawn {
            offset: spawn_offset(definition.spawn_interval, index),
            request: SpawnRequest {
                template: template.clone(),
                position: *position,
                rotation: 0.0,
                motion: motion.clone(),
                wave: Some(wave),
            },
        })
        .collect())
}

fn spawn_offset(interval: Duration, index: usize) -> Duration {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    interval.saturating_mul(index)
}

/// Cooperative task emitting the spawns of a single wave as time passes.
#[derive(Debug)]
pub struct WaveRun {
    wave: WaveId,
    started_at: Duration,
    finished_at: Duration,
    pending: VecDeque<TimedSpawn>,
}

impl WaveRun {
    /// Starts emitting `spawns` relative to the absolute timestamp `started_at`.
    #[must_use]
    pub fn start(wave: WaveId, spawns: Vec<TimedSpawn>, started_at: Duration) -> Self {
        let last_offset = spawns
            .iter()
            .map(|spawn| spawn.offset)
            .max()
            .unwrap_or(Duration::ZERO);
        Self {
            wave,
            started_at,
            finished_at: started_at.saturating_add(last_offset),
            pending: spawns.into(),
        }
    }

    /// Wave this run belongs to.
    #[must_use]
    pub const fn wave(&self) -> WaveId {
        self.wave
    }

    /// Timestamp of the final spawn.
    #[must_use]
    pub const fn finished_at(&self) -> Duration {
        self.finished_at
    }

    /// Timestamp at which the next pending spawn is due.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending
            .front()
            .map(|spawn| self.started_at.saturating_add(spawn.offset))
    }

    /// Number of spawns not yet emitted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether every spawn has been emitted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Emits, in order, every spawn due at or before `now`; returns how many were emitted.
    pub fn advance_to(&mut self, now: Duration, out: &mut Vec<Command>) -> usize {
        let mut emitted = 0;
        while let Some(due) = self.next_due() {
            if due > now {
                break;
            }
            let Some(spawn) = self.pending.pop_front() else {
                break;
            };
            log::debug!(
                "wave {} spawns {} at ({:.2}, {:.2})",
                self.wave,
                spawn.request.template,
                spawn.request.position.x,
                spawn.request.position.y
            );
            out.push(Command::SpawnEntity {
                request: spawn.request,
            });
            emitted += 1;
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_scale_with_index() {
        let interval = Duration::from_millis(250);
        assert_eq!(spawn_offset(interval, 0), Duration::ZERO);
        assert_eq!(spawn_offset(interval, 4), Duration::from_secs(1));
        assert_eq!(spawn_offset(Duration::ZERO, 9), Duration::ZERO);
    }

    #[test]
    fn empty_run_is_finished_at_its_start() {
        let run = WaveRun::start(WaveId::new(0), Vec::new(), Duration::from_secs(3));
        assert!(run.is_finished());
        assert_eq!(run.finished_at(), Duration::from_secs(3));
        assert_eq!(run.next_due(), None);
    }
}
