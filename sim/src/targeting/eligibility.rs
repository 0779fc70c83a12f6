//! Candidate filtering: turns the proximity query's output into at most one target.
//!
//! Checks run cheapest first. Identity and team checks reject most candidates
//! for free; the blocking cache rejects shots through known friendlies without
//! a trace; only survivors pay for the visibility probe.

use crate::components::{Faction, Transform, UnitClass};
use crate::config::TargetFinderConfig;
use crate::geometry::Capsule;
use crate::perception::VisibilityProbe;
use crate::targeting::blocking_cache::BlockingCache;
use crate::targeting::roster::AgentRoster;
use bevy_ecs::entity::Entity;
use glam::Vec3;

/// The agent doing the searching.
#[derive(Debug, Clone, Copy)]
pub struct Searcher {
    pub entity: Entity,
    pub transform: Transform,
    pub faction: Faction,
    pub class: UnitClass,
    pub min_caliber: f32,
}

/// Result of a successful selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquiredTarget {
    pub entity: Entity,
    pub location: Vec3,
    pub class: UnitClass,
    pub firing_line: Capsule,
}

/// Why candidates were dropped, for pass diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub stale: u32,
    pub friendly: u32,
    pub undamageable: u32,
    pub cache_rejections: u32,
    pub trace_rejections: u32,
}

impl FilterStats {
    pub fn merge(&mut self, other: &FilterStats) {
        self.stale += other.stale;
        self.friendly += other.friendly;
        self.undamageable += other.undamageable;
        self.cache_rejections += other.cache_rejections;
        self.trace_rejections += other.trace_rejections;
    }
}

/// World position of the weapon mount.
pub fn muzzle_location(transform: &Transform, class: UnitClass) -> Vec3 {
    transform.translation + transform.forward() * class.muzzle_forward() + Vec3::Z * class.muzzle_height()
}

/// Where a `shooter` aims on a target standing at `target_location`.
///
/// Heavy units aim at a light unit's feet; everything else aims at body height.
pub fn aim_point(shooter: UnitClass, target: UnitClass, target_location: Vec3, config: &TargetFinderConfig) -> Vec3 {
    if shooter.is_heavy() && !target.is_heavy() {
        target_location + Vec3::Z * (config.projectile_radius + config.feet_clearance)
    } else {
        target_location + Vec3::Z * shooter.muzzle_height()
    }
}

/// Thick line from the shooter's muzzle to its aim point on the target.
pub fn firing_line(
    shooter_transform: &Transform,
    shooter: UnitClass,
    target: UnitClass,
    target_location: Vec3,
    config: &TargetFinderConfig,
) -> Capsule {
    Capsule::new(
        muzzle_location(shooter_transform, shooter),
        aim_point(shooter, target, target_location, config),
        config.projectile_radius,
    )
}

/// Pick the first candidate that is hostile, damageable, and visible.
///
/// Friendly and undamageable candidates are remembered in `cache` as
/// obstructions. `candidates` should be ordered nearest first.
pub fn select_target<P: VisibilityProbe + ?Sized>(
    searcher: &Searcher,
    candidates: &[Entity],
    roster: &AgentRoster,
    probe: &P,
    cache: &mut BlockingCache,
    config: &TargetFinderConfig,
    stats: &mut FilterStats,
) -> Option<AcquiredTarget> {
    for &candidate in candidates {
        if candidate == searcher.entity {
            continue;
        }

        let Some(view) = roster.get(candidate) else {
            stats.stale += 1;
            continue;
        };

        let Some(faction) = view.faction else {
            continue;
        };

        if faction == searcher.faction {
            cache.insert(view.body.capsule_at(view.transform.translation), config.phase_count);
            stats.friendly += 1;
            continue;
        }

        let damageable = view
            .damageable
            .is_some_and(|d| d.damage_rating >= searcher.min_caliber);
        if !damageable {
            cache.insert(view.body.capsule_at(view.transform.translation), config.phase_count);
            stats.undamageable += 1;
            continue;
        }

        let location = view.transform.translation;
        let line = firing_line(&searcher.transform, searcher.class, view.class, location, config);

        if cache.is_blocking(&line) {
            stats.cache_rejections += 1;
            continue;
        }

        if probe.trace_blocked(line.a, line.b, config.trace_radius) {
            stats.trace_rejections += 1;
            continue;
        }

        return Some(AcquiredTarget {
            entity: candidate,
            location,
            class: view.class,
            firing_line: line,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::ClearLineOfSight;
    use crate::components::ProjectileDamageable;
    use crate::targeting::roster::AgentView;

    /// Blocks every trace that crosses the plane x = `x`.
    struct WallAt {
        x: f32,
    }

    impl VisibilityProbe for WallAt {
        fn trace_blocked(&self, start: Vec3, end: Vec3, _radius: f32) -> bool {
            (start.x - self.x).signum() != (end.x - self.x).signum()
        }
    }

    fn searcher() -> Searcher {
        Searcher {
            entity: Entity::from_raw(0),
            transform: Transform::default(),
            faction: Faction::Blue,
            class: UnitClass::Soldier,
            min_caliber: 1.0,
        }
    }

    fn view_at(x: f32, y: f32, faction: Faction) -> AgentView {
        AgentView::new(
            Transform::from_heading(Vec3::new(x, y, 0.0), std::f32::consts::PI),
            Some(faction),
            UnitClass::Soldier,
        )
    }

    #[test]
    fn test_picks_visible_enemy() {
        let mut roster = AgentRoster::default();
        let me = searcher();
        roster.insert(me.entity, view_at(0.0, 0.0, Faction::Blue));
        roster.insert(Entity::from_raw(1), view_at(5.0, 0.0, Faction::Red));

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let config = TargetFinderConfig::default();
        let candidates = [me.entity, Entity::from_raw(1)];

        let target = select_target(&me, &candidates, &roster, &ClearLineOfSight, &mut cache, &config, &mut stats)
            .expect("enemy should be selected");
        assert_eq!(target.entity, Entity::from_raw(1));
        assert_eq!(cache.live_count(), 0);
    }

    #[test]
    fn test_skips_stale_and_factionless() {
        let mut roster = AgentRoster::default();
        let me = searcher();
        roster.insert(Entity::from_raw(2), AgentView::new(Transform::default(), None, UnitClass::Soldier));

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let config = TargetFinderConfig::default();
        let candidates = [Entity::from_raw(1), Entity::from_raw(2)];

        let target = select_target(&me, &candidates, &roster, &ClearLineOfSight, &mut cache, &config, &mut stats);
        assert!(target.is_none());
        assert_eq!(stats.stale, 1);
        assert_eq!(cache.live_count(), 0, "factionless candidates are not cached");
    }

    #[test]
    fn test_undamageable_enemy_is_cached_not_selected() {
        let mut roster = AgentRoster::default();
        let me = Searcher { min_caliber: 5.0, ..searcher() };
        let mut armored = view_at(5.0, 0.0, Faction::Red);
        armored.damageable = Some(ProjectileDamageable { damage_rating: 2.0 });
        roster.insert(Entity::from_raw(1), armored);

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let config = TargetFinderConfig::default();

        let target = select_target(&me, &[Entity::from_raw(1)], &roster, &ClearLineOfSight, &mut cache, &config, &mut stats);
        assert!(target.is_none());
        assert_eq!(stats.undamageable, 1);
        assert_eq!(cache.live_count(), 1);
        assert_eq!(cache.live_entries().next().map(|e| e.phases_left), Some(config.phase_count));
    }

    #[test]
    fn test_missing_damage_profile_is_cached() {
        let mut roster = AgentRoster::default();
        let mut bare = view_at(5.0, 0.0, Faction::Red);
        bare.damageable = None;
        roster.insert(Entity::from_raw(1), bare);

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let target = select_target(
            &searcher(),
            &[Entity::from_raw(1)],
            &roster,
            &ClearLineOfSight,
            &mut cache,
            &TargetFinderConfig::default(),
            &mut stats,
        );
        assert!(target.is_none());
        assert_eq!(cache.live_count(), 1);
    }

    #[test]
    fn test_friendly_on_firing_line_blocks_enemy_behind() {
        let mut roster = AgentRoster::default();
        roster.insert(Entity::from_raw(1), view_at(4.0, 0.0, Faction::Blue));
        roster.insert(Entity::from_raw(2), view_at(5.0, 0.0, Faction::Red));

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let candidates = [Entity::from_raw(1), Entity::from_raw(2)];

        let target = select_target(
            &searcher(),
            &candidates,
            &roster,
            &ClearLineOfSight,
            &mut cache,
            &TargetFinderConfig::default(),
            &mut stats,
        );
        assert!(target.is_none());
        assert_eq!(stats.friendly, 1);
        assert_eq!(stats.cache_rejections, 1);
        assert_eq!(stats.trace_rejections, 0, "cache rejection skips the trace");
    }

    #[test]
    fn test_trace_rejection_falls_through_to_next_candidate() {
        let mut roster = AgentRoster::default();
        roster.insert(Entity::from_raw(1), view_at(30.0, 0.0, Faction::Red));
        roster.insert(Entity::from_raw(2), view_at(8.0, 2.0, Faction::Red));

        let mut cache = BlockingCache::default();
        let mut stats = FilterStats::default();
        let candidates = [Entity::from_raw(1), Entity::from_raw(2)];

        let target = select_target(
            &searcher(),
            &candidates,
            &roster,
            &WallAt { x: 20.0 },
            &mut cache,
            &TargetFinderConfig::default(),
            &mut stats,
        )
        .expect("second enemy is in front of the wall");
        assert_eq!(target.entity, Entity::from_raw(2));
        assert_eq!(stats.trace_rejections, 1);
    }

    #[test]
    fn test_vehicle_aims_at_soldier_feet() {
        let config = TargetFinderConfig::default();
        let target = Vec3::new(50.0, 0.0, 0.0);

        let heavy = aim_point(UnitClass::Vehicle, UnitClass::Soldier, target, &config);
        assert!((heavy.z - (config.projectile_radius + config.feet_clearance)).abs() < 1.0e-6);

        let light = aim_point(UnitClass::Soldier, UnitClass::Soldier, target, &config);
        assert!((light.z - UnitClass::Soldier.muzzle_height()).abs() < 1.0e-6);

        let duel = aim_point(UnitClass::Vehicle, UnitClass::Vehicle, target, &config);
        assert!((duel.z - UnitClass::Vehicle.muzzle_height()).abs() < 1.0e-6);
    }
}
