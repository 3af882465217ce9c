use std::{collections::BTreeMap, time::Duration};

use space_shooter_core::{
    Command, EntityRole, Event, LevelContext, LevelSchedule, RemovalReason, TemplateId,
};
use space_shooter_system_level_director::LevelDirector;
use space_shooter_world::{self as world, query, World};

/// Totals gathered while a level plays headless.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) elapsed: Duration,
    pub(crate) spawned: BTreeMap<TemplateId, usize>,
    pub(crate) rejected: usize,
    pub(crate) removed: BTreeMap<&'static str, usize>,
    pub(crate) wave_groups_destroyed: usize,
    pub(crate) diagnostics: usize,
    pub(crate) live_enemies: usize,
    pub(crate) waves_exhausted: bool,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EntitySpawned { template, .. } => {
                *self.spawned.entry(template.clone()).or_default() += 1;
            }
            Event::SpawnRejected { template, reason } => {
                log::warn!("spawn of {template} rejected: {reason}");
                self.rejected += 1;
            }
            Event::EntityRemoved { reason, .. } => {
                *self.removed.entry(removal_label(*reason)).or_default() += 1;
            }
            Event::WaveGroupDestroyed { wave, removed } => {
                log::debug!("wave {wave} torn down with {removed} survivors");
                self.wave_groups_destroyed += 1;
            }
            Event::TimeAdvanced { .. } => {}
        }
    }
}

fn removal_label(reason: RemovalReason) -> &'static str {
    match reason {
        RemovalReason::LeftViewport => "left viewport",
        RemovalReason::PathCompleted => "path completed",
        RemovalReason::SankBelowFloor => "sank below floor",
        RemovalReason::Destroyed => "destroyed",
        RemovalReason::WaveGroupDestroyed => "wave group destroyed",
    }
}

/// Registers every template the schedule names with the role it plays.
pub(crate) fn register_templates(world: &mut World, schedule: &LevelSchedule) {
    let mut roles = BTreeMap::new();
    for template in schedule.waves.iter().filter_map(|wave| wave.template.as_ref()) {
        let _ = roles.insert(template.clone(), EntityRole::Enemy);
    }
    for (spawner, role) in [
        (&schedule.pickups, EntityRole::Pickup),
        (&schedule.bodies, EntityRole::Body),
    ] {
        for template in spawner.iter().flat_map(|spawner| spawner.templates.iter()) {
            let _ = roles.entry(template.clone()).or_insert(role);
        }
    }

    let mut events = Vec::new();
    for (template, role) in roles {
        world::apply(world, Command::RegisterTemplate { template, role }, &mut events);
    }
}

/// Plays `schedule` for `duration` of simulated time in steps of `tick`.
pub(crate) fn simulate(schedule: LevelSchedule, duration: Duration, tick: Duration) -> Summary {
    let mut world = World::new();
    register_templates(&mut world, &schedule);
    let mut director = LevelDirector::new(schedule);
    let mut summary = Summary::default();

    while summary.elapsed < duration && !tick.is_zero() {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: tick }, &mut events);
        summary.elapsed = summary.elapsed.saturating_add(tick);

        let mut commands = Vec::new();
        director.handle(&events, LevelContext::from_source(&world), &mut commands);
        for event in &events {
            summary.record(event);
        }

        for command in commands {
            let mut generated = Vec::new();
            world::apply(&mut world, command, &mut generated);
            for event in &generated {
                summary.record(event);
            }
        }
    }

    summary.diagnostics = director.take_diagnostics().len();
    summary.live_enemies = query::live_enemies(&world);
    summary.waves_exhausted = director.is_exhausted();
    summary
}

#[cfg(test)]
mod tests {
    use space_shooter_core::{FormationKind, FormationSpec, PeriodicSpawn, WaveDefinition};

    use super::*;
    use crate::level_file::demo_level;

    #[test]
    fn demo_level_spawns_every_wave() {
        let schedule = demo_level();
        let expected: usize = schedule
            .waves
            .iter()
            .map(|wave| wave.formation.count as usize)
            .sum();
        let summary = simulate(schedule, Duration::from_secs(90), Duration::from_millis(50));

        let enemies =
            summary.spawned.get(&TemplateId::new("drone")).copied().unwrap_or_default()
                + summary
                    .spawned
                    .get(&TemplateId::new("interceptor"))
                    .copied()
                    .unwrap_or_default();
        assert_eq!(enemies, expected);
        assert!(summary.waves_exhausted);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.diagnostics, 0);
        assert!(summary.wave_groups_destroyed >= 1);
    }

    #[test]
    fn roles_follow_the_spawner_that_names_a_template() {
        let schedule = LevelSchedule {
            waves: vec![WaveDefinition::new(
                FormationSpec::new(FormationKind::Circle, 4),
                TemplateId::new("drone"),
            )],
            pickups: Some(PeriodicSpawn::pickups(vec![TemplateId::new("shield")])),
            ..LevelSchedule::default()
        };
        let summary = simulate(schedule, Duration::from_secs(16), Duration::from_millis(100));
        assert_eq!(summary.spawned.get(&TemplateId::new("shield")), Some(&1));
        assert_eq!(summary.spawned.get(&TemplateId::new("drone")), Some(&4));
        assert_eq!(summary.rejected, 0);
    }

    #[test]
    fn zero_tick_does_not_loop_forever() {
        let summary = simulate(demo_level(), Duration::from_secs(5), Duration::ZERO);
        assert_eq!(summary.elapsed, Duration::ZERO);
    }
}
