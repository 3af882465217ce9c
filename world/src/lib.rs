#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the space shooter wave engine.
//!
//! The world is the reference collaborator behind every trait systems rely
//! on: it instantiates registered templates, integrates attached motions on
//! each tick, culls entities that leave the play field, tracks wave groups,
//! and answers viewport, live-enemy and player queries.

mod motion;

use std::collections::BTreeMap;

use motion::{Movement, Pose};
use space_shooter_core::{
    dispatch, Command, EntityId, EntityRole, EntitySpawner, Event, LiveEnemyQuery,
    MotionAttachment, PlayerPresence, Position, RemovalReason, SpawnError, TemplateId, Viewport,
    ViewportQuery, WaveGroups, WaveId,
};

/// Represents the authoritative space shooter world state.
#[derive(Debug)]
pub struct World {
    templates: BTreeMap<TemplateId, EntityRole>,
    entities: BTreeMap<EntityId, Entity>,
    wave_groups: BTreeMap<WaveId, Vec<EntityId>>,
    next_entity: u32,
    viewport: Option<Viewport>,
    player_present: bool,
}

impl World {
    /// Creates an empty world with the fallback viewport and a present player.
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
            entities: BTreeMap::new(),
            wave_groups: BTreeMap::new(),
            next_entity: 0,
            viewport: Some(Viewport::FALLBACK),
            player_present: true,
        }
    }

    fn advance(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let bottom = self.viewport.unwrap_or(Viewport::FALLBACK).min_y();

        let mut removed = Vec::new();
        for (id, entity) in &mut self.entities {
            let Some(movement) = entity.movement.as_mut() else {
                continue;
            };
            if let Some(reason) = movement.integrate(&mut entity.pose, dt, bottom) {
                removed.push((*id, reason));
            }
        }

        for (id, reason) in removed {
            self.remove(id, reason, out_events);
        }
    }

    fn remove(&mut self, id: EntityId, reason: RemovalReason, out_events: &mut Vec<Event>) {
        if self.entities.remove(&id).is_some() {
            out_events.push(Event::EntityRemoved { entity: id, reason });
        }
    }

    /// Removes every surviving member of `wave`, reporting each removal.
    fn destroy_group(&mut self, wave: WaveId, out_events: &mut Vec<Event>) -> usize {
        let Some(members) = self.wave_groups.remove(&wave) else {
            return 0;
        };
        let before = out_events.len();
        for id in members {
            self.remove(id, RemovalReason::WaveGroupDestroyed, out_events);
        }
        out_events.len() - before
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Entity {
    template: TemplateId,
    role: EntityRole,
    pose: Pose,
    movement: Option<Movement>,
    wave: Option<WaveId>,
}

impl EntitySpawner for World {
    fn spawn(
        &mut self,
        template: &TemplateId,
        position: Position,
        rotation: f32,
    ) -> Result<EntityId, SpawnError> {
        let role = *self
            .templates
            .get(template)
            .ok_or_else(|| SpawnError::UnknownTemplate(template.clone()))?;

        self.next_entity = self.next_entity.saturating_add(1);
        let id = EntityId::new(self.next_entity);
        let _ = self.entities.insert(
            id,
            Entity {
                template: template.clone(),
                role,
                pose: Pose { position, rotation },
                movement: None,
                wave: None,
            },
        );
        Ok(id)
    }
}

impl MotionAttachment for World {
    fn attach_straight_down(&mut self, entity: EntityId, speed: f32) {
        if let Some(entity) = self.entity_mut(entity) {
            entity.movement = Some(Movement::StraightDown { speed });
        }
    }

    fn attach_path_follow(
        &mut self,
        entity: EntityId,
        points: &[Position],
        speed: f32,
        rotate_along_path: bool,
    ) {
        let Some(entity) = self.entity_mut(entity) else {
            return;
        };
        let Some(first) = points.first().copied() else {
            return;
        };

        entity.pose.position = first;
        if rotate_along_path {
            if let Some(second) = points.get(1) {
                entity.pose.rotation = motion::facing(*second - first);
            }
        }
        entity.movement = Some(Movement::PathFollow {
            points: points.to_vec(),
            next: 1,
            speed,
            rotate_along_path,
        });
    }

    fn attach_sink_below(&mut self, entity: EntityId, speed: f32, floor_y: f32) {
        if let Some(entity) = self.entity_mut(entity) {
            entity.movement = Some(Movement::SinkBelow { speed, floor_y });
        }
    }
}

impl WaveGroups for World {
    fn join_wave_group(&mut self, entity: EntityId, wave: WaveId) {
        let Some(member) = self.entity_mut(entity) else {
            return;
        };
        member.wave = Some(wave);
        self.wave_groups.entry(wave).or_default().push(entity);
    }

    fn destroy_wave_group(&mut self, wave: WaveId) -> usize {
        let mut removals = Vec::new();
        self.destroy_group(wave, &mut removals)
    }
}

impl LiveEnemyQuery for World {
    fn count_live_enemies(&self) -> usize {
        self.entities
            .values()
            .filter(|entity| entity.role == EntityRole::Enemy)
            .count()
    }
}

impl ViewportQuery for World {
    fn current_viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}

impl PlayerPresence for World {
    fn player_present(&self) -> bool {
        self.player_present
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt.as_secs_f32(), out_events);
        }
        Command::ConfigureViewport { viewport } => world.viewport = viewport,
        Command::SetPlayerPresent { present } => world.player_present = present,
        Command::RegisterTemplate { template, role } => {
            let _ = world.templates.insert(template, role);
        }
        Command::DestroyEntity { entity } => {
            world.remove(entity, RemovalReason::Destroyed, out_events);
        }
        Command::DestroyWaveGroup { wave } => {
            let removed = world.destroy_group(wave, out_events);
            out_events.push(Event::WaveGroupDestroyed { wave, removed });
        }
        command @ Command::SpawnEntity { .. } => dispatch(world, command, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Entity, World};
    use space_shooter_core::{
        EntityId, EntityRole, LiveEnemyQuery, Position, SpawnError, TemplateId, WaveId,
    };

    /// Indicates whether a player is present.
    #[must_use]
    pub fn player_present(world: &World) -> bool {
        world.player_present
    }

    /// Number of live entities whose template plays the enemy role.
    #[must_use]
    pub fn live_enemies(world: &World) -> usize {
        world.count_live_enemies()
    }

    /// Number of members of a wave group that are still alive.
    #[must_use]
    pub fn wave_group_size(world: &World, wave: WaveId) -> usize {
        world.wave_groups.get(&wave).map_or(0, |members| {
            members
                .iter()
                .filter(|id| world.entities.contains_key(id))
                .count()
        })
    }

    /// Captures a read-only snapshot of one entity.
    pub fn entity(world: &World, id: EntityId) -> Result<EntitySnapshot, SpawnError> {
        world
            .entities
            .get(&id)
            .map(|entity| EntitySnapshot::capture(id, entity))
            .ok_or(SpawnError::UnknownEntity(id))
    }

    /// Captures a read-only view of every live entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView {
            snapshots: world
                .entities
                .iter()
                .map(|(id, entity)| EntitySnapshot::capture(*id, entity))
                .collect(),
        }
    }

    /// Read-only snapshot describing all live entities.
    #[derive(Clone, Debug)]
    pub struct EntityView {
        snapshots: Vec<EntitySnapshot>,
    }

    impl EntityView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
            self.snapshots.iter()
        }

        /// Number of captured snapshots.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether the view captured no entities.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }
    }

    /// Immutable representation of a single entity used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EntitySnapshot {
        /// Unique identifier assigned to the entity.
        pub id: EntityId,
        /// Template the entity was created from.
        pub template: TemplateId,
        /// Role inherited from the template.
        pub role: EntityRole,
        /// Current position in world space.
        pub position: Position,
        /// Current rotation in radians.
        pub rotation: f32,
        /// Wave group the entity belongs to, if any.
        pub wave: Option<WaveId>,
    }

    impl EntitySnapshot {
        fn capture(id: EntityId, entity: &Entity) -> Self {
            Self {
                id,
                template: entity.template.clone(),
                role: entity.role,
                position: entity.pose.position,
                rotation: entity.pose.rotation,
                wave: entity.wave,
            }
        }
    }
}
