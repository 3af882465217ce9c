#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the space shooter formation and wave engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems read an immutable
//! [`LevelContext`] together with the [`Event`] stream produced by the world,
//! and respond exclusively with [`Command`] batches. The world executes those
//! commands, typically by forwarding spawn requests through [`dispatch`] to
//! its [`EntitySpawner`], [`MotionAttachment`] and [`WaveGroups`]
//! implementations.

use std::{fmt, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Point in world space. The y axis grows upward.
pub type Position = Vec2;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the region currently visible to the camera.
    ConfigureViewport {
        /// Visible region, or `None` when the camera is unavailable.
        viewport: Option<Viewport>,
    },
    /// Declares whether a player is present in the level.
    SetPlayerPresent {
        /// Presence flag reported to systems.
        present: bool,
    },
    /// Registers an entity template and the role its instances play.
    RegisterTemplate {
        /// Identifier systems use to request instances.
        template: TemplateId,
        /// Role assigned to every instance of the template.
        role: EntityRole,
    },
    /// Requests creation of an entity with an attached motion behaviour.
    SpawnEntity {
        /// Complete description of the entity to create.
        request: SpawnRequest,
    },
    /// Requests removal of a single entity, for example after it was shot down.
    DestroyEntity {
        /// Identifier of the entity to remove.
        entity: EntityId,
    },
    /// Requests removal of every entity still attached to a wave's group.
    DestroyWaveGroup {
        /// Wave whose group should be torn down.
        wave: WaveId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an entity was created.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Template the entity was created from.
        template: TemplateId,
        /// Position the entity was created at.
        position: Position,
        /// Wave group the entity joined, if any.
        wave: Option<WaveId>,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Template named by the rejected request.
        template: TemplateId,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that an entity left the world.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Why the entity was removed.
        reason: RemovalReason,
    },
    /// Confirms that a wave group was torn down.
    WaveGroupDestroyed {
        /// Wave whose group was destroyed.
        wave: WaveId,
        /// Number of entities that were still alive in the group.
        removed: usize,
    },
}

/// Reasons an entity may leave the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// The entity drifted out of the visible region.
    LeftViewport,
    /// The entity reached the final point of its path.
    PathCompleted,
    /// The entity sank past its configured floor.
    SankBelowFloor,
    /// The entity was explicitly destroyed.
    Destroyed,
    /// The wave group owning the entity was destroyed.
    WaveGroupDestroyed,
}

/// Named geometric arrangement of spawn positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationKind {
    /// Evenly spaced horizontal line.
    Straight,
    /// Downward-opening V with its apex in the middle.
    V,
    /// Two lobes above a wide middle row narrowing to a point.
    Heart,
    /// Parabolic arc.
    Bow,
    /// Filled diamond with rows of 1, 3, 5, ... positions.
    Diamond,
    /// Points evenly spaced on a circle.
    Circle,
    /// Grid of centred rows.
    MultipleRows,
    /// Rhombus whose rows grow by one position up to its side length.
    Rhombus,
    /// Grid of centred rows with odd rows shifted right.
    ZigZag,
}

impl FormationKind {
    /// Every formation kind in declaration order.
    pub const ALL: [FormationKind; 9] = [
        Self::Straight,
        Self::V,
        Self::Heart,
        Self::Bow,
        Self::Diamond,
        Self::Circle,
        Self::MultipleRows,
        Self::Rhombus,
        Self::ZigZag,
    ];
}

/// Immutable descriptor consumed once per formation generation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationSpec {
    /// Shape to lay out.
    pub kind: FormationKind,
    /// Number of positions to produce.
    pub count: u32,
    /// Distance between neighbouring positions in world units.
    pub spacing: f32,
    /// Radius used by [`FormationKind::Circle`].
    pub radius: f32,
    /// Row count used by [`FormationKind::MultipleRows`] and [`FormationKind::ZigZag`].
    pub rows: u32,
    /// Horizontal extent used by [`FormationKind::Bow`].
    pub width: f32,
    /// Vertical extent used by [`FormationKind::V`] and [`FormationKind::Bow`].
    pub height: f32,
}

impl FormationSpec {
    /// Creates a descriptor for `count` positions using default shape parameters.
    #[must_use]
    pub fn new(kind: FormationKind, count: u32) -> Self {
        Self {
            kind,
            count,
            ..Self::default()
        }
    }
}

impl Default for FormationSpec {
    fn default() -> Self {
        Self {
            kind: FormationKind::Straight,
            count: 5,
            spacing: 1.0,
            radius: 2.0,
            rows: 3,
            width: 4.0,
            height: 2.0,
        }
    }
}

/// Rectangular region of world space currently visible to the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

impl Viewport {
    /// Region assumed whenever the camera cannot be queried.
    ///
    /// Matches a portrait 9:16 camera with an orthographic size of five units.
    pub const FALLBACK: Viewport = Viewport::new(-2.8125, 2.8125, -5.0, 5.0);

    /// Creates a viewport from its edges.
    #[must_use]
    pub const fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Left edge in world units.
    #[must_use]
    pub const fn min_x(&self) -> f32 {
        self.min_x
    }

    /// Right edge in world units.
    #[must_use]
    pub const fn max_x(&self) -> f32 {
        self.max_x
    }

    /// Bottom edge in world units.
    #[must_use]
    pub const fn min_y(&self) -> f32 {
        self.min_y
    }

    /// Top edge in world units.
    #[must_use]
    pub const fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Horizontal extent in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Vertical extent in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Centre of the region in world units.
    #[must_use]
    pub fn center(&self) -> Position {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Reports whether the region has no usable area.
    ///
    /// Non-finite edges count as degenerate so that normalisation never divides
    /// by zero or propagates NaN.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let width = self.width();
        let height = self.height();
        !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
    }

    /// Converts a world position into viewport space, where the visible region spans `[0, 1]²`.
    #[must_use]
    pub fn normalize(&self, position: Position) -> Vec2 {
        Vec2::new(
            (position.x - self.min_x) / self.width(),
            (position.y - self.min_y) / self.height(),
        )
    }

    /// Converts a viewport-space coordinate back into world space.
    #[must_use]
    pub fn denormalize(&self, normalized: Vec2) -> Position {
        Vec2::new(
            self.min_x + normalized.x * self.width(),
            self.min_y + normalized.y * self.height(),
        )
    }
}

/// Identifier of an entity template, the engine's prefab.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Creates a template identifier from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the template.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a spawned entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based index of a wave within its level schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveId(u32);

impl WaveId {
    /// Creates a new wave identifier with the provided index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the index of the wave.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

/// Role an entity plays in the level, derived from its template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRole {
    /// Hostile ship counted by the live-enemy census.
    Enemy,
    /// Collectible power-up.
    Pickup,
    /// Decorative celestial body.
    Body,
}

/// Motion behaviour attached to an entity when it spawns.
#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
    /// Moves straight down until it leaves the visible region.
    StraightDown {
        /// Speed in world units per second.
        speed: f32,
    },
    /// Moves point to point along a path and disappears at the final point.
    PathFollow {
        /// Ordered waypoints of the path.
        points: Vec<Position>,
        /// Speed in world units per second.
        speed: f32,
        /// Whether the entity turns to face its direction of travel.
        rotate_along_path: bool,
    },
    /// Moves straight down and removes itself below `floor_y`.
    SinkBelow {
        /// Speed in world units per second.
        speed: f32,
        /// Height below which the entity removes itself.
        floor_y: f32,
    },
}

/// Complete description of an entity to create.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Template to instantiate.
    pub template: TemplateId,
    /// Initial position in world space.
    pub position: Position,
    /// Initial rotation in radians.
    pub rotation: f32,
    /// Motion behaviour attached after creation.
    pub motion: Motion,
    /// Wave group the entity joins, if any.
    pub wave: Option<WaveId>,
}

/// One scheduled batch of enemy spawns.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveDefinition {
    /// Layout of the spawn positions.
    pub formation: FormationSpec,
    /// Enemy template; `None` marks an unconfigured wave that is skipped.
    pub template: Option<TemplateId>,
    /// Movement speed of the spawned enemies.
    pub speed: f32,
    /// Delay between consecutive spawns; zero spawns the whole formation at once.
    pub spawn_interval: Duration,
    /// Explicit path the enemies follow; empty means straight-down motion.
    pub path_points: Vec<Position>,
    /// Whether path-following enemies turn to face their direction of travel.
    pub rotate_along_path: bool,
    /// Delay before this wave under a fixed-delay gap; zero uses the level default.
    pub custom_delay: Duration,
}

impl WaveDefinition {
    /// Creates a wave spawning `template` in the provided formation.
    #[must_use]
    pub fn new(formation: FormationSpec, template: TemplateId) -> Self {
        Self {
            formation,
            template: Some(template),
            ..Self::default()
        }
    }
}

impl Default for WaveDefinition {
    fn default() -> Self {
        Self {
            formation: FormationSpec::default(),
            template: None,
            speed: 3.0,
            spawn_interval: Duration::from_millis(500),
            path_points: Vec::new(),
            rotate_along_path: false,
            custom_delay: Duration::ZERO,
        }
    }
}

/// Policy deciding when the next wave may start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapPolicy {
    /// Waits a fixed delay, then tears down the previous wave regardless of survivors.
    FixedDelay,
    /// Waits until the previous wave's enemies are eliminated.
    ClearGated,
}

/// Independent spawner firing at a fixed interval.
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicSpawn {
    /// Templates chosen from uniformly at random on each firing.
    pub templates: Vec<TemplateId>,
    /// Delay between firings.
    pub interval: Duration,
    /// Additional delay before the first interval starts.
    pub warm_up: Duration,
    /// Downward speed of spawned entities.
    pub speed: f32,
}

impl PeriodicSpawn {
    /// Pickup spawner firing every fifteen seconds.
    #[must_use]
    pub fn pickups(templates: Vec<TemplateId>) -> Self {
        Self {
            templates,
            interval: Duration::from_secs(15),
            warm_up: Duration::ZERO,
            speed: 2.0,
        }
    }

    /// Decorative body spawner firing every eight seconds after a ten second warm-up.
    #[must_use]
    pub fn bodies(templates: Vec<TemplateId>) -> Self {
        Self {
            templates,
            interval: Duration::from_secs(8),
            warm_up: Duration::from_secs(10),
            speed: 3.0,
        }
    }
}

/// Ordered wave sequence plus the level's periodic spawners.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSchedule {
    /// Waves in the order they are played.
    pub waves: Vec<WaveDefinition>,
    /// Policy applied between consecutive waves.
    pub gap_policy: GapPolicy,
    /// Delay before the first wave starts.
    pub first_wave_delay: Duration,
    /// Default fixed delay between waves.
    pub delay_between_waves: Duration,
    /// Pickup spawner, if the level has one.
    pub pickups: Option<PeriodicSpawn>,
    /// Decorative body spawner, if the level has one.
    pub bodies: Option<PeriodicSpawn>,
    /// Seed for every random choice the director makes.
    pub seed: u64,
}

impl Default for LevelSchedule {
    fn default() -> Self {
        Self {
            waves: Vec::new(),
            gap_policy: GapPolicy::FixedDelay,
            first_wave_delay: Duration::ZERO,
            delay_between_waves: Duration::from_secs(8),
            pickups: None,
            bodies: None,
            seed: 0,
        }
    }
}

/// Reasons a spawn or motion request may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SpawnError {
    /// No template with the provided identifier was registered.
    #[error("unknown template `{0}`")]
    UnknownTemplate(TemplateId),
    /// No entity with the provided identifier exists.
    #[error("unknown entity {}", .0.get())]
    UnknownEntity(EntityId),
}

/// Periodic spawners owned by a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodicKind {
    /// Power-up spawner.
    Pickup,
    /// Decorative body spawner.
    Body,
}

impl fmt::Display for PeriodicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup => f.write_str("pickup"),
            Self::Body => f.write_str("body"),
        }
    }
}

/// Non-fatal conditions surfaced to the caller while a level plays.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// The level schedule contains no waves.
    #[error("level schedule contains no waves")]
    EmptySchedule,
    /// A wave has no enemy template and was skipped.
    #[error("wave {wave} has no enemy template; skipping")]
    MissingTemplate {
        /// Wave that was skipped.
        wave: WaveId,
    },
    /// A wave requested zero enemies and was skipped.
    #[error("wave {wave} requests no enemies; skipping")]
    EmptyFormation {
        /// Wave that was skipped.
        wave: WaveId,
    },
    /// A wave was due while no player was present and was skipped.
    #[error("wave {wave} skipped because no player is present")]
    PlayerAbsent {
        /// Wave that was skipped.
        wave: WaveId,
    },
    /// The camera could not be queried and the fallback viewport was used.
    #[error("viewport unavailable; using fallback region")]
    ViewportFallback,
    /// A periodic spawner cannot fire and was disabled.
    #[error("{kind} spawner disabled: {cause}")]
    SpawnerDisabled {
        /// Spawner that was disabled.
        kind: PeriodicKind,
        /// Human-readable cause.
        cause: &'static str,
    },
}

/// Creates entities from templates.
pub trait EntitySpawner {
    /// Instantiates `template` at `position` with `rotation` radians.
    fn spawn(
        &mut self,
        template: &TemplateId,
        position: Position,
        rotation: f32,
    ) -> Result<EntityId, SpawnError>;
}

/// Attaches per-frame motion behaviours to spawned entities.
pub trait MotionAttachment {
    /// Moves the entity straight down at `speed` until it leaves the visible region.
    fn attach_straight_down(&mut self, entity: EntityId, speed: f32);

    /// Moves the entity along `points` at `speed`, removing it at the final point.
    fn attach_path_follow(
        &mut self,
        entity: EntityId,
        points: &[Position],
        speed: f32,
        rotate_along_path: bool,
    );

    /// Moves the entity straight down at `speed`, removing it below `floor_y`.
    fn attach_sink_below(&mut self, entity: EntityId, speed: f32, floor_y: f32);
}

/// Groups entities by the wave that spawned them.
pub trait WaveGroups {
    /// Adds the entity to the wave's group.
    fn join_wave_group(&mut self, entity: EntityId, wave: WaveId);

    /// Removes every surviving entity of the wave's group, returning how many were removed.
    fn destroy_wave_group(&mut self, wave: WaveId) -> usize;
}

/// Counts entities tagged as enemies that are still alive.
pub trait LiveEnemyQuery {
    /// Number of live enemies.
    fn count_live_enemies(&self) -> usize;
}

/// Reports the region currently visible to the camera.
pub trait ViewportQuery {
    /// Visible region, or `None` when the camera cannot be queried.
    fn current_viewport(&self) -> Option<Viewport>;
}

/// Reports whether a player currently exists.
pub trait PlayerPresence {
    /// Whether a player is present.
    fn player_present(&self) -> bool;
}

/// Read-only collaborators handed to systems on every update.
#[derive(Clone, Copy)]
pub struct LevelContext<'a> {
    /// Camera collaborator.
    pub viewport: &'a dyn ViewportQuery,
    /// Live-enemy census collaborator.
    pub enemies: &'a dyn LiveEnemyQuery,
    /// Player collaborator.
    pub player: &'a dyn PlayerPresence,
}

impl<'a> LevelContext<'a> {
    /// Builds a context whose collaborators are all served by `source`.
    #[must_use]
    pub fn from_source<S>(source: &'a S) -> Self
    where
        S: ViewportQuery + LiveEnemyQuery + PlayerPresence,
    {
        Self {
            viewport: source,
            enemies: source,
            player: source,
        }
    }
}

impl fmt::Debug for LevelContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelContext")
            .field("viewport", &self.viewport.current_viewport())
            .field("live_enemies", &self.enemies.count_live_enemies())
            .field("player_present", &self.player.player_present())
            .finish()
    }
}

/// Executes spawn and wave-group commands against an entity collaborator.
///
/// Commands that configure the world itself are ignored; the world handles
/// those before delegating here. A rejected spawn is reported through
/// [`Event::SpawnRejected`] and never aborts the batch.
pub fn dispatch<C>(collaborator: &mut C, command: Command, out_events: &mut Vec<Event>)
where
    C: EntitySpawner + MotionAttachment + WaveGroups + ?Sized,
{
    match command {
        Command::SpawnEntity { request } => spawn_with_motion(collaborator, request, out_events),
        Command::DestroyWaveGroup { wave } => {
            let removed = collaborator.destroy_wave_group(wave);
            out_events.push(Event::WaveGroupDestroyed { wave, removed });
        }
        Command::Tick { .. }
        | Command::ConfigureViewport { .. }
        | Command::SetPlayerPresent { .. }
        | Command::RegisterTemplate { .. }
        | Command::DestroyEntity { .. } => {}
    }
}

fn spawn_with_motion<C>(collaborator: &mut C, request: SpawnRequest, out_events: &mut Vec<Event>)
where
    C: EntitySpawner + MotionAttachment + WaveGroups + ?Sized,
{
    let SpawnRequest {
        template,
        position,
        rotation,
        motion,
        wave,
    } = request;

    let entity = match collaborator.spawn(&template, position, rotation) {
        Ok(entity) => entity,
        Err(reason) => {
            out_events.push(Event::SpawnRejected { template, reason });
            return;
        }
    };

    match motion {
        Motion::StraightDown { speed } => collaborator.attach_straight_down(entity, speed),
        Motion::PathFollow {
            points,
            speed,
            rotate_along_path,
        } => collaborator.attach_path_follow(entity, &points, speed, rotate_along_path),
        Motion::SinkBelow { speed, floor_y } => {
            collaborator.attach_sink_below(entity, speed, floor_y);
        }
    }

    if let Some(wave) = wave {
        collaborator.join_wave_group(entity, wave);
    }

    out_events.push(Event::EntitySpawned {
        entity,
        template,
        position,
        wave,
    });
}
