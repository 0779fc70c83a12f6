//! Read-only per-pass view of every agent that may show up as a candidate.
//!
//! Workers look candidates up here instead of touching the ECS world, so the
//! parallel phase never aliases component storage that the scheduler writes.

use crate::components::{AgentBody, Faction, ProjectileDamageable, Transform, UnitClass};
use bevy_ecs::entity::Entity;
use std::collections::HashMap;

/// What the eligibility filter needs to know about a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub transform: Transform,
    pub faction: Option<Faction>,
    pub damageable: Option<ProjectileDamageable>,
    pub class: UnitClass,
    pub body: AgentBody,
}

impl AgentView {
    pub fn new(transform: Transform, faction: Option<Faction>, class: UnitClass) -> Self {
        Self {
            transform,
            faction,
            damageable: Some(ProjectileDamageable::default()),
            class,
            body: class.default_body(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AgentRoster {
    views: HashMap<Entity, AgentView>,
}

impl AgentRoster {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            views: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, entity: Entity, view: AgentView) {
        self.views.insert(entity, view);
    }

    pub fn remove(&mut self, entity: Entity) -> Option<AgentView> {
        self.views.remove(&entity)
    }

    /// `None` for entities that were despawned or never registered.
    pub fn get(&self, entity: Entity) -> Option<&AgentView> {
        self.views.get(&entity)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
