//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that can be sent to a renderer or written to disk.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single agent's state for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub faction: Faction,
    pub class: UnitClass,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Yaw in radians.
    pub heading: f32,
    /// `AgentId` of the tracked target.
    pub target: Option<u32>,
    pub vertical_aim_offset: f32,
    /// Still looking for a target.
    pub searching: bool,
    /// Live entries in the blocking cache.
    pub cached_blockers: usize,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// Sub-cell every searching agent inspects next pass.
    pub phase: u8,
    /// All agents, ordered by id.
    pub agents: Vec<AgentSnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32, phase: u8) -> Self {
        let mut ids = world.query::<(Entity, &AgentId)>();
        let id_of: std::collections::HashMap<Entity, u32> =
            ids.iter(world).map(|(entity, id)| (entity, id.0)).collect();

        let mut query = world.query::<(
            &AgentId,
            &Faction,
            &Transform,
            Option<&UnitClass>,
            Option<&TargetEntity>,
            Has<NeedsEnemyTarget>,
        )>();

        let mut agents: Vec<AgentSnapshot> = query
            .iter(world)
            .map(|(id, faction, transform, class, record, searching)| AgentSnapshot {
                id: id.0,
                faction: *faction,
                class: class.copied().unwrap_or_default(),
                x: transform.translation.x,
                y: transform.translation.y,
                z: transform.translation.z,
                heading: transform.yaw(),
                target: record
                    .and_then(|r| r.entity)
                    .and_then(|target| id_of.get(&target).copied()),
                vertical_aim_offset: record.map(|r| r.vertical_aim_offset).unwrap_or(0.0),
                searching,
                cached_blockers: record.map(|r| r.blocking.live_count()).unwrap_or(0),
            })
            .collect();
        agents.sort_by_key(|a| a.id);

        Self {
            tick,
            time,
            phase,
            agents,
        }
    }

    pub fn agent(&self, id: u32) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
