use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use space_shooter_core::{
    FormationKind, FormationSpec, GapPolicy, LevelSchedule, PeriodicSpawn, TemplateId, Vec2,
    WaveDefinition,
};

/// Level file format version understood by this build.
pub(crate) const SUPPORTED_LEVEL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    version: u32,
    #[serde(default)]
    gap_policy: Option<GapPolicy>,
    #[serde(default)]
    first_wave_delay_secs: Option<f32>,
    #[serde(default)]
    delay_between_waves_secs: Option<f32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    waves: Vec<WaveEntry>,
    #[serde(default)]
    pickups: Option<PeriodicEntry>,
    #[serde(default)]
    bodies: Option<PeriodicEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaveEntry {
    #[serde(default)]
    formation: FormationSpec,
    #[serde(default)]
    template: Option<TemplateId>,
    #[serde(default)]
    speed: Option<f32>,
    #[serde(default)]
    spawn_interval_secs: Option<f32>,
    #[serde(default)]
    path: Vec<Vec2>,
    #[serde(default)]
    rotate_along_path: bool,
    #[serde(default)]
    custom_delay_secs: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PeriodicEntry {
    templates: Vec<TemplateId>,
    #[serde(default)]
    interval_secs: Option<f32>,
    #[serde(default)]
    warm_up_secs: Option<f32>,
    #[serde(default)]
    speed: Option<f32>,
}

/// Reads and validates the level file at `path`.
pub(crate) fn load_level(path: &Path) -> Result<LevelSchedule> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file at {}", path.display()))?;
    parse_level(&contents)
        .with_context(|| format!("failed to load level file at {}", path.display()))
}

/// Parses a level from TOML source.
pub(crate) fn parse_level(contents: &str) -> Result<LevelSchedule> {
    let file: LevelFile = toml::from_str(contents).context("failed to parse level toml contents")?;
    if file.version != SUPPORTED_LEVEL_VERSION {
        bail!(
            "unsupported level file version {}; expected {}",
            file.version,
            SUPPORTED_LEVEL_VERSION
        );
    }

    let defaults = LevelSchedule::default();
    let mut waves = Vec::with_capacity(file.waves.len());
    for (index, entry) in file.waves.into_iter().enumerate() {
        let wave = wave_definition(entry).with_context(|| format!("invalid wave {}", index + 1))?;
        waves.push(wave);
    }

    Ok(LevelSchedule {
        waves,
        gap_policy: file.gap_policy.unwrap_or(defaults.gap_policy),
        first_wave_delay: seconds_or(
            "first_wave_delay_secs",
            file.first_wave_delay_secs,
            defaults.first_wave_delay,
        )?,
        delay_between_waves: seconds_or(
            "delay_between_waves_secs",
            file.delay_between_waves_secs,
            defaults.delay_between_waves,
        )?,
        pickups: file
            .pickups
            .map(|entry| {
                periodic(entry, PeriodicSpawn::pickups).context("invalid pickups section")
            })
            .transpose()?,
        bodies: file
            .bodies
            .map(|entry| periodic(entry, PeriodicSpawn::bodies).context("invalid bodies section"))
            .transpose()?,
        seed: file.seed.unwrap_or(defaults.seed),
    })
}

fn wave_definition(entry: WaveEntry) -> Result<WaveDefinition> {
    let mut definition = WaveDefinition {
        formation: entry.formation,
        template: entry.template,
        ..WaveDefinition::default()
    };
    if let Some(speed) = entry.speed {
        if !speed.is_finite() {
            bail!("`speed` must be finite");
        }
        definition.speed = speed;
    }
    definition.spawn_interval = seconds_or(
        "spawn_interval_secs",
        entry.spawn_interval_secs,
        definition.spawn_interval,
    )?;
    definition.custom_delay = seconds_or(
        "custom_delay_secs",
        entry.custom_delay_secs,
        definition.custom_delay,
    )?;
    definition.path_points = entry.path;
    definition.rotate_along_path = entry.rotate_along_path;
    Ok(definition)
}

fn periodic(
    entry: PeriodicEntry,
    defaults: impl FnOnce(Vec<TemplateId>) -> PeriodicSpawn,
) -> Result<PeriodicSpawn> {
    let mut spawn = defaults(entry.templates);
    spawn.interval = seconds_or("interval_secs", entry.interval_secs, spawn.interval)?;
    spawn.warm_up = seconds_or("warm_up_secs", entry.warm_up_secs, spawn.warm_up)?;
    if let Some(speed) = entry.speed {
        spawn.speed = speed;
    }
    Ok(spawn)
}

fn seconds_or(field: &str, value: Option<f32>, default: Duration) -> Result<Duration> {
    match value {
        Some(seconds) => Duration::try_from_secs_f32(seconds).with_context(|| {
            format!("`{field}` must be a finite, non-negative number of seconds, got {seconds}")
        }),
        None => Ok(default),
    }
}

/// Built-in level played when no level file is supplied.
pub(crate) fn demo_level() -> LevelSchedule {
    let drone = TemplateId::new("drone");
    let interceptor = TemplateId::new("interceptor");

    let mut waves = vec![
        WaveDefinition::new(FormationSpec::new(FormationKind::V, 5), drone.clone()),
        WaveDefinition::new(FormationSpec::new(FormationKind::Diamond, 9), drone.clone()),
        WaveDefinition::new(
            FormationSpec::new(FormationKind::Circle, 8),
            interceptor.clone(),
        ),
        WaveDefinition::new(FormationSpec::new(FormationKind::Heart, 10), drone),
    ];

    let mut swoop = WaveDefinition::new(FormationSpec::new(FormationKind::Straight, 6), interceptor);
    swoop.path_points = vec![
        Vec2::new(-2.0, 6.0),
        Vec2::new(-1.0, 2.0),
        Vec2::new(1.5, 0.0),
        Vec2::new(0.0, -7.0),
    ];
    swoop.rotate_along_path = true;
    swoop.custom_delay = Duration::from_secs(4);
    waves.push(swoop);

    LevelSchedule {
        waves,
        first_wave_delay: Duration::from_secs(1),
        pickups: Some(PeriodicSpawn::pickups(vec![TemplateId::new("shield")])),
        bodies: Some(PeriodicSpawn::bodies(vec![
            TemplateId::new("planet"),
            TemplateId::new("moon"),
        ])),
        seed: 0x5eed_1e7e,
        ..LevelSchedule::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"
version = 1
gap_policy = "ClearGated"
first_wave_delay_secs = 0.5
seed = 7

[[waves]]
template = "drone"
spawn_interval_secs = 0.25
custom_delay_secs = 3.0
formation = { kind = "Diamond", count = 9, spacing = 1.5 }

[[waves]]
formation = { kind = "Straight", count = 4 }
template = "interceptor"
speed = 5.0
path = [[0.0, 6.0], [0.0, -6.0]]
rotate_along_path = true

[[waves]]
formation = { kind = "V", count = 3 }

[pickups]
templates = ["shield"]
interval_secs = 10.0
"#;

    #[test]
    fn parses_a_complete_level() {
        let schedule = parse_level(LEVEL).expect("level parses");

        assert_eq!(schedule.gap_policy, GapPolicy::ClearGated);
        assert_eq!(schedule.first_wave_delay, Duration::from_millis(500));
        assert_eq!(schedule.delay_between_waves, Duration::from_secs(8));
        assert_eq!(schedule.seed, 7);
        assert_eq!(schedule.waves.len(), 3);

        let first = &schedule.waves[0];
        assert_eq!(first.template, Some(TemplateId::new("drone")));
        assert_eq!(first.formation.kind, FormationKind::Diamond);
        assert_eq!(first.formation.count, 9);
        assert!((first.formation.spacing - 1.5).abs() < f32::EPSILON);
        assert_eq!(first.formation.rows, FormationSpec::default().rows);
        assert_eq!(first.spawn_interval, Duration::from_millis(250));
        assert_eq!(first.custom_delay, Duration::from_secs(3));

        let second = &schedule.waves[1];
        assert_eq!(
            second.path_points,
            vec![Vec2::new(0.0, 6.0), Vec2::new(0.0, -6.0)]
        );
        assert!(second.rotate_along_path);
        assert!((second.speed - 5.0).abs() < f32::EPSILON);

        assert_eq!(schedule.waves[2].template, None);

        let pickups = schedule.pickups.expect("pickups configured");
        assert_eq!(pickups.templates, vec![TemplateId::new("shield")]);
        assert_eq!(pickups.interval, Duration::from_secs(10));
        assert!((pickups.speed - 2.0).abs() < f32::EPSILON);
        assert!(schedule.bodies.is_none());
    }

    #[test]
    fn rejects_unsupported_versions() {
        let error = parse_level("version = 2").expect_err("version 2 is rejected");
        assert!(error.to_string().contains("unsupported level file version 2"));
    }

    #[test]
    fn rejects_negative_durations_with_context() {
        let error = parse_level(
            r#"
version = 1
[[waves]]
template = "drone"
spawn_interval_secs = -1.0
"#,
        )
        .expect_err("negative interval is rejected");
        let message = format!("{error:#}");
        assert!(message.contains("invalid wave 1"), "{message}");
        assert!(message.contains("spawn_interval_secs"), "{message}");
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse_level("version = 1\nwaves_between = 3").is_err());
    }

    #[test]
    fn demo_level_is_playable() {
        let schedule = demo_level();
        assert!(!schedule.waves.is_empty());
        assert!(schedule
            .waves
            .iter()
            .all(|wave| wave.template.is_some() && wave.formation.count > 0));
    }
}
