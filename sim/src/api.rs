//! Public API for the simulation.
//!
//! This module provides the main interface for a host (renderer, tool or
//! test harness) to drive target acquisition.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 30 Hz). When `step(dt)` is called,
//! the simulation accumulates time and runs fixed updates as needed. Each fixed update is one
//! target finder pass, so the sub-cell rotation is independent of frame rate.

use crate::components::*;
use crate::config::{AgentArchetype, ConfigError, Gravity, TargetFinderConfig};
use crate::debug_draw::{DebugDrawSink, DebugShape};
use crate::perception::{sound_decay_system, SoundField};
use crate::spatial::{spatial_grid_update_system, MultiLevelGrid};
use crate::systems::*;
use crate::targeting::FinderPhase;
use crate::terrain::TerrainGrid;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::sync::mpsc::Receiver;
use tracing::warn;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Registering agents and their search archetypes
/// - Stepping the simulation forward
/// - Feeding sounds and terrain
/// - Extracting state snapshots
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::with_config(TargetFinderConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    pub fn with_config(config: TargetFinderConfig) -> Self {
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SimTick(0));
        world.insert_resource(MultiLevelGrid::new(config.grid_base_cell_size, config.grid_levels));
        world.insert_resource(FinderPhase::default());
        world.insert_resource(Gravity::default());
        world.insert_resource(SoundField::default());
        world.insert_resource(TerrainGrid::default());
        world.insert_resource(DebugDrawSink::default());
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                spatial_grid_update_system,
                sound_decay_system,
                target_validation_system,
                target_finder_system,
                tick_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    /// Load the configuration from JSON and build a world with it.
    pub fn from_config_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_config(TargetFinderConfig::from_json(json)?))
    }

    /// Two facing lines of soldiers with a vehicle on each side.
    pub fn new_default_test_world() -> Self {
        let mut sim = Self::new();
        let archetype = AgentArchetype::default();

        for i in 0..6u32 {
            let y = -25.0 + i as f32 * 10.0;
            let _ = sim.spawn_agent(i, Faction::Blue, UnitClass::Soldier, Vec3::new(-20.0, y, 0.0), 0.0, &archetype);
            let _ = sim.spawn_agent(
                100 + i,
                Faction::Red,
                UnitClass::Soldier,
                Vec3::new(20.0, y, 0.0),
                std::f32::consts::PI,
                &archetype,
            );
        }
        let _ = sim.spawn_agent(50, Faction::Blue, UnitClass::Vehicle, Vec3::new(-35.0, 0.0, 0.0), 0.0, &archetype);
        let _ = sim.spawn_agent(
            150,
            Faction::Red,
            UnitClass::Vehicle,
            Vec3::new(35.0, 0.0, 0.0),
            std::f32::consts::PI,
            &archetype,
        );

        sim
    }

    /// Spawn an agent that searches for targets according to `archetype`.
    ///
    /// The archetype is validated against the current configuration first.
    /// `position` is the agent's feet in world space; on uneven terrain take it
    /// from `terrain().ground_position(x, y)`.
    pub fn spawn_agent(
        &mut self,
        id: u32,
        faction: Faction,
        class: UnitClass,
        position: Vec3,
        heading: f32,
        archetype: &AgentArchetype,
    ) -> Result<Entity, ConfigError> {
        if let Err(error) = archetype.validate(self.config()) {
            warn!(agent = id, error = %error, "archetype_rejected");
            return Err(error);
        }

        let transform = Transform::from_heading(position, heading);
        let entity = self
            .world
            .spawn((
                AgentBundle::new(id, faction, class, transform),
                TargetFinderBundle {
                    record: archetype.target_entity(),
                    parameters: archetype.search_parameters(),
                    move_target: MoveTarget::standing(position, transform.forward()),
                    marker: NeedsEnemyTarget,
                },
            ))
            .id();
        Ok(entity)
    }

    /// Spawn an agent that can be targeted but never searches.
    pub fn spawn_passive_agent(&mut self, id: u32, faction: Faction, class: UnitClass, position: Vec3, heading: f32) -> Entity {
        self.world
            .spawn(AgentBundle::new(id, faction, class, Transform::from_heading(position, heading)))
            .id()
    }

    /// Spawn `count` searching agents in a grid formation.
    /// Returns the number of agents spawned.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_mass_agents(
        &mut self,
        faction: Faction,
        center: Vec3,
        heading: f32,
        count: usize,
        spread: f32,
        start_id: u32,
        archetype: &AgentArchetype,
    ) -> Result<usize, ConfigError> {
        let cols = (count as f32).sqrt().ceil().max(1.0) as usize;
        let spacing = spread / cols as f32;

        for i in 0..count {
            let row = i / cols;
            let col = i % cols;
            let x = center.x + (col as f32 - cols as f32 / 2.0) * spacing;
            let y = center.y + (row as f32 - (count / cols) as f32 / 2.0) * spacing;
            self.spawn_agent(start_id + i as u32, faction, UnitClass::Soldier, Vec3::new(x, y, center.z), heading, archetype)?;
        }
        Ok(count)
    }

    /// Despawn the agent with `id`. Returns false if no such agent exists.
    pub fn despawn_agent(&mut self, id: u32) -> bool {
        match self.find_agent(id) {
            Some(entity) => self.world.despawn(entity),
            None => false,
        }
    }

    /// Move an agent. Its heading is left unchanged.
    pub fn set_agent_position(&mut self, id: u32, position: Vec3) -> bool {
        let Some(entity) = self.find_agent(id) else {
            return false;
        };
        match self.world.get_mut::<Transform>(entity) {
            Some(mut transform) => {
                transform.translation = position;
                true
            }
            None => false,
        }
    }

    /// Record a sound made by `faction` at `source`.
    pub fn emit_sound(&mut self, source: Vec3, faction: Faction, audible_radius: f32, lifetime: f32) {
        self.world
            .resource_mut::<SoundField>()
            .emit(source, faction, audible_radius, lifetime);
    }

    /// Step the simulation forward by `dt` seconds.
    ///
    /// Uses fixed timestep internally - accumulates time and runs fixed updates
    /// as needed.
    pub fn step(&mut self, dt: f32) {
        let fixed_dt = self.config().fixed_timestep;

        self.time_accumulator += dt;
        while self.time_accumulator >= fixed_dt {
            self.fixed_update(fixed_dt);
            self.time_accumulator -= fixed_dt;
        }
    }

    /// Run a single fixed timestep update.
    fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        let phase = self.finder_phase();
        Snapshot::from_world(&mut self.world, self.tick, self.time, phase)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Route debug shapes to the returned receiver.
    pub fn enable_debug_draw(&mut self) -> Receiver<DebugShape> {
        let (sink, rx) = DebugDrawSink::channel();
        self.world.insert_resource(sink);
        rx
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Sub-cell index the next pass will inspect.
    pub fn finder_phase(&self) -> u8 {
        self.world.resource::<FinderPhase>().0
    }

    pub fn config(&self) -> &TargetFinderConfig {
        self.world.resource::<TargetFinderConfig>()
    }

    pub fn config_mut(&mut self) -> Mut<'_, TargetFinderConfig> {
        self.world.resource_mut::<TargetFinderConfig>()
    }

    pub fn set_gravity(&mut self, gravity_z: f32) {
        self.world.insert_resource(Gravity(gravity_z));
    }

    pub fn terrain(&self) -> &TerrainGrid {
        self.world.resource::<TerrainGrid>()
    }

    pub fn terrain_mut(&mut self) -> Mut<'_, TerrainGrid> {
        self.world.resource_mut::<TerrainGrid>()
    }

    /// Replace the terrain wholesale.
    pub fn set_terrain(&mut self, terrain: TerrainGrid) {
        self.world.insert_resource(terrain);
    }

    /// Current target of agent `id`, as an agent id.
    pub fn target_of(&mut self, id: u32) -> Option<u32> {
        let entity = self.find_agent(id)?;
        let target = self.world.get::<TargetEntity>(entity)?.entity?;
        self.world.get::<AgentId>(target).map(|a| a.0)
    }

    fn find_agent(&mut self, id: u32) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &AgentId)>();
        query
            .iter(&self.world)
            .find(|(_, agent)| agent.0 == id)
            .map(|(entity, _)| entity)
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &MultiLevelGrid {
        self.world.resource::<MultiLevelGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
