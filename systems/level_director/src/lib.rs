#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level director that sequences waves and runs the level's periodic spawners.
//!
//! The director is a tick-driven system: it accumulates
//! [`Event::TimeAdvanced`] into an internal clock and moves through
//! `Idle → Spawning → Gap → Spawning → … → Exhausted`. Wave transitions and
//! periodic firings are keyed to absolute timestamps and processed earliest
//! first, so one large step emits the same commands in the same order as a
//! sequence of small steps covering the same span. Waves and periodic
//! spawners draw from separate random streams of the level seed.

mod gate;
mod periodic;

pub use gate::{ClearGate, CLEAR_GRACE, CLEAR_POLLS_REQUIRED, CLEAR_POLL_INTERVAL, CLEAR_SETTLE};

use std::time::Duration;

use periodic::PeriodicSpawner;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use space_shooter_core::{
    Command, Diagnostic, Event, GapPolicy, LevelContext, LevelSchedule, PeriodicKind, Viewport,
    WaveDefinition, WaveId,
};
use space_shooter_system_formation::generate;
use space_shooter_system_viewport_fit::{fit, spawn_origin, SpawnSide};
use space_shooter_system_wave_scheduler::{schedule_wave, TimedSpawn, WaveRun};

#[derive(Debug)]
enum Phase {
    Idle { start_at: Duration },
    Spawning(WaveRun),
    FixedGap { until: Duration },
    ClearGap { next_poll: Duration, gate: ClearGate },
    Settling { until: Duration },
    Exhausted,
}

/// Pure system driving one level schedule.
#[derive(Debug)]
pub struct LevelDirector {
    schedule: LevelSchedule,
    clock: Duration,
    rng: ChaCha8Rng,
    periodic_rng: ChaCha8Rng,
    phase: Phase,
    next_wave: usize,
    previous_wave: Option<WaveId>,
    pickups: Option<PeriodicSpawner>,
    bodies: Option<PeriodicSpawner>,
    diagnostics: Vec<Diagnostic>,
    viewport_unavailable: bool,
    cancelled: bool,
}

/// Random stream reserved for periodic spawners.
const PERIODIC_STREAM: u64 = 1;

impl LevelDirector {
    /// Creates a director that starts its first wave after `first_wave_delay`.
    #[must_use]
    pub fn new(schedule: LevelSchedule) -> Self {
        let mut periodic_rng = ChaCha8Rng::seed_from_u64(schedule.seed);
        periodic_rng.set_stream(PERIODIC_STREAM);
        let mut director = Self {
            clock: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(schedule.seed),
            periodic_rng,
            phase: Phase::Idle {
                start_at: schedule.first_wave_delay,
            },
            next_wave: 0,
            previous_wave: None,
            pickups: None,
            bodies: None,
            diagnostics: Vec::new(),
            viewport_unavailable: false,
            cancelled: false,
            schedule,
        };

        if director.schedule.waves.is_empty() {
            director.report(Diagnostic::EmptySchedule);
            director.phase = Phase::Exhausted;
        }
        director.pickups = director.periodic(PeriodicKind::Pickup);
        director.bodies = director.periodic(PeriodicKind::Body);
        director
    }

    fn periodic(&mut self, kind: PeriodicKind) -> Option<PeriodicSpawner> {
        let config = match kind {
            PeriodicKind::Pickup => self.schedule.pickups.as_ref(),
            PeriodicKind::Body => self.schedule.bodies.as_ref(),
        }?;
        match PeriodicSpawner::new(kind, config, self.clock) {
            Ok(spawner) => Some(spawner),
            Err(diagnostic) => {
                self.report(diagnostic);
                None
            }
        }
    }

    /// Consumes events and immutable collaborators to emit spawn and teardown commands.
    pub fn handle(&mut self, events: &[Event], context: LevelContext<'_>, out: &mut Vec<Command>) {
        if self.cancelled {
            return;
        }

        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.clock = self.clock.saturating_add(*dt);
            }
        }

        loop {
            let wave_due = self.next_deadline().filter(|at| *at <= self.clock);
            let periodic_due = self.next_periodic().filter(|(at, _)| *at <= self.clock);
            match (wave_due, periodic_due) {
                (None, None) => break,
                (Some(at), Some((fire_at, _))) if at <= fire_at => self.step(at, context, out),
                (Some(at), None) => self.step(at, context, out),
                (_, Some((_, kind))) => self.fire_periodic(kind, context, out),
            }
        }
    }

    /// Discards every pending wave and periodic task; later calls to
    /// [`LevelDirector::handle`] emit nothing.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        log::info!("level cancelled at {:.2}s", self.clock.as_secs_f32());
        self.cancelled = true;
        self.phase = Phase::Exhausted;
        self.pickups = None;
        self.bodies = None;
    }

    /// Drains the diagnostics reported since the previous call.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Reports whether every wave has been played, skipped or cancelled.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.phase, Phase::Exhausted)
    }

    /// Reports whether [`LevelDirector::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Wave currently emitting spawns, if any.
    #[must_use]
    pub fn active_wave(&self) -> Option<WaveId> {
        match &self.phase {
            Phase::Spawning(run) => Some(run.wave()),
            _ => None,
        }
    }

    /// Simulated time the director has observed.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Timestamp at which the current phase next needs attention.
    fn next_deadline(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Idle { start_at } => Some(*start_at),
            Phase::Spawning(run) => run.next_due(),
            Phase::FixedGap { until } | Phase::Settling { until } => Some(*until),
            Phase::ClearGap { next_poll, .. } => Some(*next_poll),
            Phase::Exhausted => None,
        }
    }

    /// Earliest pending periodic firing; pickups win ties.
    fn next_periodic(&self) -> Option<(Duration, PeriodicKind)> {
        [
            (&self.pickups, PeriodicKind::Pickup),
            (&self.bodies, PeriodicKind::Body),
        ]
        .into_iter()
        .filter_map(|(spawner, kind)| {
            spawner
                .as_ref()
                .map(|spawner| (spawner.next_fire(), kind))
        })
        .min_by_key(|(at, _)| *at)
    }

    /// Advances the wave phase whose deadline `at` has been reached.
    fn step(&mut self, at: Duration, context: LevelContext<'_>, out: &mut Vec<Command>) {
        match &mut self.phase {
            Phase::Idle { .. } => self.begin_next_wave(at, context),
            Phase::Spawning(run) => {
                let _ = run.advance_to(at, out);
                if run.is_finished() {
                    let (wave, finished_at) = (run.wave(), run.finished_at());
                    self.previous_wave = Some(wave);
                    self.enter_gap(finished_at);
                }
            }
            Phase::FixedGap { .. } | Phase::Settling { .. } => {
                self.destroy_previous_wave(out);
                self.begin_next_wave(at, context);
            }
            Phase::ClearGap { next_poll, gate } => {
                if gate.observe(context.enemies.count_live_enemies()) {
                    log::debug!("wave cleared at {:.2}s", at.as_secs_f32());
                    self.phase = Phase::Settling {
                        until: at.saturating_add(CLEAR_SETTLE),
                    };
                } else {
                    *next_poll = at.saturating_add(CLEAR_POLL_INTERVAL);
                }
            }
            Phase::Exhausted => {}
        }
    }

    fn enter_gap(&mut self, at: Duration) {
        let Some(next) = self.schedule.waves.get(self.next_wave) else {
            log::info!("all waves played at {:.2}s", at.as_secs_f32());
            self.phase = Phase::Exhausted;
            return;
        };

        self.phase = match self.schedule.gap_policy {
            GapPolicy::FixedDelay => {
                let delay = if next.custom_delay.is_zero() {
                    self.schedule.delay_between_waves
                } else {
                    next.custom_delay
                };
                Phase::FixedGap {
                    until: at.saturating_add(delay),
                }
            }
            GapPolicy::ClearGated => Phase::ClearGap {
                next_poll: at.saturating_add(CLEAR_GRACE),
                gate: ClearGate::new(),
            },
        };
    }

    fn destroy_previous_wave(&mut self, out: &mut Vec<Command>) {
        if let Some(wave) = self.previous_wave.take() {
            log::debug!("tearing down wave {wave}");
            out.push(Command::DestroyWaveGroup { wave });
        }
    }

    /// Starts the next playable wave at `at`, skipping waves that cannot be played.
    fn begin_next_wave(&mut self, at: Duration, context: LevelContext<'_>) {
        while let Some(definition) = self.schedule.waves.get(self.next_wave).cloned() {
            let wave = WaveId::new(u32::try_from(self.next_wave).unwrap_or(u32::MAX));
            self.next_wave += 1;

            match self.plan_wave(wave, &definition, context) {
                Ok(plan) => {
                    log::info!(
                        "wave {wave} starts at {:.2}s with {} enemies",
                        at.as_secs_f32(),
                        plan.len()
                    );
                    self.phase = Phase::Spawning(WaveRun::start(wave, plan, at));
                    return;
                }
                Err(diagnostic) => self.report(diagnostic),
            }
        }

        log::info!("all waves played at {:.2}s", at.as_secs_f32());
        self.phase = Phase::Exhausted;
    }

    fn plan_wave(
        &mut self,
        wave: WaveId,
        definition: &WaveDefinition,
        context: LevelContext<'_>,
    ) -> Result<Vec<TimedSpawn>, Diagnostic> {
        if definition.template.is_none() {
            return Err(Diagnostic::MissingTemplate { wave });
        }
        if definition.formation.count == 0 {
            return Err(Diagnostic::EmptyFormation { wave });
        }
        if !context.player.player_present() {
            return Err(Diagnostic::PlayerAbsent { wave });
        }

        let viewport = self.viewport(context);
        let side = if self.rng.gen_bool(0.5) {
            SpawnSide::Left
        } else {
            SpawnSide::Right
        };
        let lane = self.rng.gen_range(0.0_f32..=1.0_f32);
        let origin = spawn_origin(&viewport, side, lane);

        let positions = fit(&generate(&definition.formation, origin), &viewport);
        schedule_wave(wave, definition, &positions)
    }

    /// Current viewport, or the fallback rectangle when none is usable.
    ///
    /// The fallback is reported once each time the viewport becomes unusable.
    fn viewport(&mut self, context: LevelContext<'_>) -> Viewport {
        match context.viewport.current_viewport() {
            Some(viewport) if !viewport.is_degenerate() => {
                self.viewport_unavailable = false;
                viewport
            }
            _ => {
                if !self.viewport_unavailable {
                    self.viewport_unavailable = true;
                    self.report(Diagnostic::ViewportFallback);
                }
                Viewport::FALLBACK
            }
        }
    }

    fn fire_periodic(
        &mut self,
        kind: PeriodicKind,
        context: LevelContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let player_present = context.player.player_present();
        let viewport = if player_present {
            Some(self.viewport(context))
        } else {
            None
        };
        let spawner = match kind {
            PeriodicKind::Pickup => self.pickups.as_mut(),
            PeriodicKind::Body => self.bodies.as_mut(),
        };
        let Some(spawner) = spawner else {
            return;
        };
        match viewport {
            Some(viewport) => spawner.fire(&viewport, &mut self.periodic_rng, out),
            None => spawner.skip(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use space_shooter_core::{
        FormationKind, FormationSpec, LiveEnemyQuery, PeriodicSpawn, PlayerPresence, TemplateId,
        ViewportQuery,
    };

    use super::*;

    #[derive(Debug)]
    struct Stage {
        viewport: Option<Viewport>,
        live: usize,
        player: bool,
    }

    impl ViewportQuery for Stage {
        fn current_viewport(&self) -> Option<Viewport> {
            self.viewport
        }
    }

    impl LiveEnemyQuery for Stage {
        fn count_live_enemies(&self) -> usize {
            self.live
        }
    }

    impl PlayerPresence for Stage {
        fn player_present(&self) -> bool {
            self.player
        }
    }

    fn one_wave() -> LevelSchedule {
        LevelSchedule {
            waves: vec![WaveDefinition::new(
                FormationSpec::new(FormationKind::Straight, 2),
                TemplateId::new("drone"),
            )],
            ..LevelSchedule::default()
        }
    }

    #[test]
    fn empty_schedule_is_reported_and_exhausted() {
        let mut director = LevelDirector::new(LevelSchedule::default());
        assert!(director.is_exhausted());
        assert_eq!(director.take_diagnostics(), vec![Diagnostic::EmptySchedule]);
        assert!(director.take_diagnostics().is_empty());
    }

    #[test]
    fn missing_viewport_falls_back_with_a_diagnostic() {
        let stage = Stage {
            viewport: None,
            live: 0,
            player: true,
        };
        let mut director = LevelDirector::new(one_wave());
        let mut out = Vec::new();
        director.handle(&[], LevelContext::from_source(&stage), &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(director.active_wave(), Some(WaveId::new(0)));
        assert_eq!(director.take_diagnostics(), vec![Diagnostic::ViewportFallback]);
    }

    #[test]
    fn degenerate_viewport_falls_back_with_a_diagnostic() {
        let stage = Stage {
            viewport: Some(Viewport::new(0.0, 0.0, 0.0, 0.0)),
            live: 0,
            player: true,
        };
        let mut director = LevelDirector::new(one_wave());
        let mut out = Vec::new();
        director.handle(&[], LevelContext::from_source(&stage), &mut out);

        match out.as_slice() {
            [Command::SpawnEntity { request }] => {
                let fallback = Viewport::FALLBACK;
                assert!(request.position.x >= fallback.min_x());
                assert!(request.position.x <= fallback.max_x());
            }
            other => panic!("unexpected commands {other:?}"),
        }
        assert_eq!(director.take_diagnostics(), vec![Diagnostic::ViewportFallback]);
    }

    #[test]
    fn viewport_fallback_is_reported_once_per_outage() {
        let schedule = LevelSchedule {
            pickups: Some(PeriodicSpawn {
                interval: Duration::from_secs(1),
                ..PeriodicSpawn::pickups(vec![TemplateId::new("shield")])
            }),
            ..one_wave()
        };
        let mut stage = Stage {
            viewport: None,
            live: 0,
            player: true,
        };
        let mut director = LevelDirector::new(schedule);
        let second = [Event::TimeAdvanced {
            dt: Duration::from_secs(1),
        }];
        let mut out = Vec::new();

        for _ in 0..5 {
            director.handle(&second, LevelContext::from_source(&stage), &mut out);
        }
        assert_eq!(director.take_diagnostics(), vec![Diagnostic::ViewportFallback]);

        stage.viewport = Some(Viewport::FALLBACK);
        director.handle(&second, LevelContext::from_source(&stage), &mut out);
        assert!(director.take_diagnostics().is_empty());

        stage.viewport = None;
        for _ in 0..3 {
            director.handle(&second, LevelContext::from_source(&stage), &mut out);
        }
        assert_eq!(director.take_diagnostics(), vec![Diagnostic::ViewportFallback]);
    }

    #[test]
    fn clear_gate_waits_for_grace_and_polls() {
        let mut schedule = one_wave();
        schedule.waves.push(schedule.waves[0].clone());
        schedule.gap_policy = GapPolicy::ClearGated;
        schedule.waves[0].spawn_interval = Duration::ZERO;
        let stage = Stage {
            viewport: Some(Viewport::FALLBACK),
            live: 0,
            player: true,
        };
        let context = LevelContext::from_source(&stage);
        let mut director = LevelDirector::new(schedule);
        let mut out = Vec::new();
        director.handle(&[], context, &mut out);
        assert_eq!(out.len(), 2);

        // Grace 3 s, polls at 3.0, 3.5 and 4.0, settle until 5.0.
        let mut later = Vec::new();
        director.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(4_999),
            }],
            context,
            &mut later,
        );
        assert!(later.is_empty());

        director.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(1),
            }],
            context,
            &mut later,
        );
        assert_eq!(
            later.first(),
            Some(&Command::DestroyWaveGroup {
                wave: WaveId::new(0)
            })
        );
    }
}
