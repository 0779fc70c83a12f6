//! ECS Components for the target acquisition simulation.
//!
//! Components are pure data containers attached to entities.
//! All acquisition logic lives in `targeting` and the systems that drive it.

use crate::geometry::Capsule;
use crate::targeting::blocking_cache::BlockingCache;
use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Cosine of the largest angle still considered "facing" a direction (~5 degrees).
const FACING_COS_THRESHOLD: f32 = 0.996;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// World transform of an agent. Z is up, the local X axis is forward.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    /// Transform at `translation` turned `yaw` radians counter-clockwise from +X.
    pub fn from_heading(translation: Vec3, yaw: f32) -> Self {
        Self {
            translation,
            rotation: Quat::from_rotation_z(yaw),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Right-hand side when looking along `forward` with Z up.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Y
    }

    /// Heading angle around Z in radians.
    pub fn yaw(&self) -> f32 {
        let forward = self.forward();
        forward.y.atan2(forward.x)
    }

    /// Whether the horizontal forward vector points along `direction`.
    pub fn is_facing(&self, direction: Vec3) -> bool {
        let facing = self.forward().truncate().normalize_or_zero();
        let wanted = direction.truncate().normalize_or_zero();
        facing.dot(wanted) >= FACING_COS_THRESHOLD
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Stable external identifier for an agent.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Team membership. `Blue` is team 1.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Blue,
    Red,
}

impl Faction {
    pub fn is_team1(&self) -> bool {
        matches!(self, Faction::Blue)
    }

    pub fn opponent(&self) -> Faction {
        match self {
            Faction::Blue => Faction::Red,
            Faction::Red => Faction::Blue,
        }
    }
}

/// Weapon platform class. Vehicles are heavy units, soldiers are light.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    #[default]
    Soldier,
    Vehicle,
}

impl UnitClass {
    /// Height of the weapon mount above the agent's feet.
    pub fn muzzle_height(&self) -> f32 {
        match self {
            UnitClass::Soldier => 1.5,
            UnitClass::Vehicle => 1.8,
        }
    }

    /// Distance of the weapon mount ahead of the agent's origin.
    pub fn muzzle_forward(&self) -> f32 {
        match self {
            UnitClass::Soldier => 3.0,
            UnitClass::Vehicle => 8.0,
        }
    }

    /// Horizontal muzzle velocity in world units per second.
    pub fn projectile_speed(&self) -> f32 {
        match self {
            UnitClass::Soldier => 60.0,
            UnitClass::Vehicle => 100.0,
        }
    }

    pub fn is_heavy(&self) -> bool {
        matches!(self, UnitClass::Vehicle)
    }

    pub fn default_body(&self) -> AgentBody {
        match self {
            UnitClass::Soldier => AgentBody { radius: 0.4, height: 1.8 },
            UnitClass::Vehicle => AgentBody { radius: 2.0, height: 3.0 },
        }
    }
}

/// Rough body volume of an agent, used as an occluder.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    pub radius: f32,
    pub height: f32,
}

impl Default for AgentBody {
    fn default() -> Self {
        UnitClass::Soldier.default_body()
    }
}

impl AgentBody {
    /// Upright capsule standing on `feet`.
    pub fn capsule_at(&self, feet: Vec3) -> Capsule {
        let top = (self.height - self.radius).max(self.radius);
        Capsule::new(
            feet + Vec3::Z * self.radius,
            feet + Vec3::Z * top,
            self.radius,
        )
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// How much punch a weapon needs before this agent counts as damageable.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileDamageable {
    pub damage_rating: f32,
}

impl Default for ProjectileDamageable {
    fn default() -> Self {
        Self { damage_rating: 1.0 }
    }
}

/// Per-agent target acquisition record.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct TargetEntity {
    /// Currently tracked target, if any.
    pub entity: Option<Entity>,
    /// Candidates rated below this are treated as obstructions, never targets.
    pub min_caliber: f32,
    /// Sub-cell grid dimension; the search area is `breadth x breadth` cells.
    pub search_breadth: u8,
    /// Vertical launch velocity computed for the last acquired target.
    pub vertical_aim_offset: f32,
    /// Recently seen bodies that cannot be targeted but block fire.
    pub blocking: BlockingCache,
}

impl TargetEntity {
    pub fn new(min_caliber: f32, search_breadth: u8) -> Self {
        Self {
            entity: None,
            min_caliber,
            search_breadth,
            vertical_aim_offset: 0.0,
            blocking: BlockingCache::default(),
        }
    }

    pub fn has_target(&self) -> bool {
        self.entity.is_some()
    }

    pub fn clear_target(&mut self) {
        self.entity = None;
        self.vertical_aim_offset = 0.0;
    }
}

/// Marker: the agent is looking for a visual target.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct NeedsEnemyTarget;

/// Marker: the agent has a target and is tracking it.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct TrackingTarget;

/// Scheduling parameters shared by every agent of one archetype.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchParameters {
    /// Number of worker ranges the archetype's batch is split into.
    pub worker_count: usize,
    /// Emit search areas to the debug draw sink.
    pub draw_search_areas: bool,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            worker_count: 4,
            draw_search_areas: false,
        }
    }
}

// ============================================================================
// MOVEMENT COMPONENTS
// ============================================================================

/// What the movement layer is currently executing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementAction {
    #[default]
    Stand,
    Move,
}

/// Movement goal consumed by the (external) navigation layer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveTarget {
    pub action: MovementAction,
    /// Bumped every time a new action is created.
    pub action_id: u16,
    pub center: Vec3,
    pub forward: Vec3,
}

impl MoveTarget {
    /// Standing still at `center`, facing `forward`.
    pub fn standing(center: Vec3, forward: Vec3) -> Self {
        Self {
            action: MovementAction::Stand,
            action_id: 0,
            center,
            forward,
        }
    }

    pub fn create_new_action(&mut self, action: MovementAction) {
        self.action = action;
        self.action_id = self.action_id.wrapping_add(1);
    }

    /// Standing, or holding the initial move that was never replaced.
    pub fn is_standing(&self) -> bool {
        self.action == MovementAction::Stand
            || (self.action == MovementAction::Move && self.action_id == 0)
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a targetable agent.
#[derive(Bundle, Default)]
pub struct AgentBundle {
    pub id: AgentId,
    pub faction: Faction,
    pub class: UnitClass,
    pub transform: Transform,
    pub body: AgentBody,
    pub damageable: ProjectileDamageable,
}

impl AgentBundle {
    pub fn new(id: u32, faction: Faction, class: UnitClass, transform: Transform) -> Self {
        Self {
            id: AgentId(id),
            faction,
            class,
            transform,
            body: class.default_body(),
            damageable: ProjectileDamageable::default(),
        }
    }
}

/// Bundle that turns an agent into a target seeker.
#[derive(Bundle)]
pub struct TargetFinderBundle {
    pub record: TargetEntity,
    pub parameters: SearchParameters,
    pub move_target: MoveTarget,
    pub marker: NeedsEnemyTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_basis() {
        let t = Transform::from_heading(Vec3::ZERO, FRAC_PI_2);
        assert!((t.forward() - Vec3::Y).length() < 1.0e-5);
        // Facing +Y with Z up, right hand points to +X
        assert!((t.right() - Vec3::X).length() < 1.0e-5);
        assert!((t.yaw() - FRAC_PI_2).abs() < 1.0e-5);
    }

    #[test]
    fn test_is_facing() {
        let t = Transform::default();
        assert!(t.is_facing(Vec3::new(5.0, 0.0, 3.0)));
        assert!(!t.is_facing(Vec3::new(1.0, 1.0, 0.0)));
        assert!(!t.is_facing(Vec3::ZERO));
    }

    #[test]
    fn test_move_target_standing() {
        let mut mt = MoveTarget::standing(Vec3::ZERO, Vec3::X);
        assert!(mt.is_standing());

        mt.action = MovementAction::Move;
        assert!(mt.is_standing(), "initial move counts as standing");

        mt.create_new_action(MovementAction::Move);
        assert!(!mt.is_standing());
        assert_eq!(mt.action_id, 1);
    }

    #[test]
    fn test_body_capsule() {
        let capsule = AgentBody { radius: 0.4, height: 1.8 }.capsule_at(Vec3::new(1.0, 2.0, 0.0));
        assert!((capsule.a.z - 0.4).abs() < 1.0e-6);
        assert!((capsule.b.z - 1.4).abs() < 1.0e-6);
        assert_eq!(capsule.radius, 0.4);
    }
}
