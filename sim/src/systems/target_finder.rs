//! Target finder system - runs one acquisition pass per tick.
//!
//! ## Data Access
//! - Reads: TargetFinderConfig, Gravity, MultiLevelGrid, SoundField, TerrainGrid
//! - Reads: Transform, Faction, ProjectileDamageable, UnitClass, AgentBody (all agents)
//! - Writes: TargetEntity, MoveTarget (searching agents), FinderPhase
//! - Writes: TargetEntity blocking cache (every other agent, aged once per pass)
//! - Deferred: NeedsEnemyTarget -> TrackingTarget for agents that acquired
//!
//! The heavy lifting happens in `targeting::scheduler`; this system only
//! extracts jobs from the world and writes the results back.

use crate::components::*;
use crate::config::{Gravity, TargetFinderConfig};
use crate::debug_draw::DebugDrawSink;
use crate::perception::{ClearLineOfSight, SoundField, SoundPerception, VisibilityProbe};
use crate::spatial::MultiLevelGrid;
use crate::targeting::roster::{AgentRoster, AgentView};
use crate::targeting::scheduler::{run_finder_pass, CompletionQueue, FinderJob, FinderPhase, PassContext};
use crate::terrain::TerrainGrid;
use bevy_ecs::prelude::*;
use tracing::debug;

type CandidateQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        Option<&'static Faction>,
        Option<&'static ProjectileDamageable>,
        Option<&'static UnitClass>,
        Option<&'static AgentBody>,
    ),
>;

type SearcherQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static Transform,
        &'static Faction,
        Option<&'static UnitClass>,
        &'static SearchParameters,
        &'static mut TargetEntity,
        Option<&'static mut MoveTarget>,
    ),
    With<NeedsEnemyTarget>,
>;

type IdleRecordQuery<'w, 's> = Query<'w, 's, &'static mut TargetEntity, Without<NeedsEnemyTarget>>;

/// Read-only world collaborators, grouped to keep the system signature short.
#[derive(bevy_ecs::system::SystemParam)]
pub struct FinderWorld<'w> {
    grid: Res<'w, MultiLevelGrid>,
    gravity: Option<Res<'w, Gravity>>,
    sounds: Option<Res<'w, SoundField>>,
    terrain: Option<Res<'w, TerrainGrid>>,
    debug: Option<Res<'w, DebugDrawSink>>,
}

/// System that searches for targets on behalf of every `NeedsEnemyTarget` agent.
pub fn target_finder_system(
    mut commands: Commands,
    config: Res<TargetFinderConfig>,
    mut phase: ResMut<FinderPhase>,
    world: FinderWorld,
    candidates: CandidateQuery,
    mut searchers: SearcherQuery,
    mut idle: IdleRecordQuery,
) {
    if config.skip_finding_targets {
        return;
    }

    // Searchers age their caches inside the pass; everyone else ages here
    for mut record in &mut idle {
        if record.blocking.live_count() > 0 {
            record.blocking.decay();
        }
    }

    // EXTRACT: snapshot of every potential candidate and every searcher
    let mut roster = AgentRoster::with_capacity(candidates.iter().len());
    for (entity, transform, faction, damageable, class, body) in candidates.iter() {
        let class = class.copied().unwrap_or_default();
        roster.insert(
            entity,
            AgentView {
                transform: *transform,
                faction: faction.copied(),
                damageable: damageable.copied(),
                class,
                body: body.copied().unwrap_or_else(|| class.default_body()),
            },
        );
    }

    let mut jobs: Vec<FinderJob> = searchers
        .iter()
        .map(|(entity, transform, faction, class, parameters, record, move_target)| FinderJob {
            entity,
            transform: *transform,
            faction: *faction,
            class: class.copied().unwrap_or_default(),
            parameters: *parameters,
            record: record.clone(),
            move_target: move_target.map(|mt| *mt),
        })
        .collect();

    // COMPUTE
    let no_sounds = SoundField::default();
    let sounds: &dyn SoundPerception = match world.sounds.as_deref() {
        Some(field) => field,
        None => &no_sounds,
    };
    let probe: &dyn VisibilityProbe = match world.terrain.as_deref() {
        Some(terrain) => terrain,
        None => &ClearLineOfSight,
    };
    let no_debug = DebugDrawSink::default();
    let ctx = PassContext {
        index: &*world.grid,
        roster: &roster,
        sounds,
        probe,
        config: &*config,
        gravity_z: world.gravity.as_deref().copied().unwrap_or_default().0,
        phase: phase.0,
        debug: world.debug.as_deref().unwrap_or(&no_debug),
    };
    let queue = CompletionQueue::default();
    let stats = run_finder_pass(&mut jobs, &ctx, &queue);

    // APPLY: write records back, then drain the completion queue
    for job in jobs {
        let Ok((_, _, _, _, _, mut record, move_target)) = searchers.get_mut(job.entity) else {
            continue;
        };
        *record = job.record;
        if let (Some(mut current), Some(updated)) = (move_target, job.move_target) {
            if *current != updated {
                *current = updated;
            }
        }
    }

    for entity in queue.drain() {
        commands.entity(entity).remove::<NeedsEnemyTarget>().insert(TrackingTarget);
    }

    debug!(
        phase = phase.0,
        searched = stats.searched,
        acquired = stats.acquired,
        turned_to_sound = stats.turned_to_sound,
        candidates = stats.candidates,
        cache_rejections = stats.filter.cache_rejections,
        trace_rejections = stats.filter.trace_rejections,
        "target_finder_pass"
    );

    phase.advance(config.phase_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Capsule;
    use crate::spatial::spatial_grid_update_system;
    use crate::terrain::TerrainType;
    use glam::Vec3;
    use std::f32::consts::PI;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(TargetFinderConfig::default());
        world.insert_resource(FinderPhase::default());
        world.insert_resource(MultiLevelGrid::default());
        world.insert_resource(Gravity::default());
        world
    }

    fn spawn_searcher(world: &mut World, id: u32, faction: Faction, position: Vec3, yaw: f32) -> Entity {
        let transform = Transform::from_heading(position, yaw);
        world
            .spawn((
                AgentBundle::new(id, faction, UnitClass::Soldier, transform),
                TargetFinderBundle {
                    record: TargetEntity::new(1.0, 1),
                    parameters: SearchParameters::default(),
                    move_target: MoveTarget::standing(position, transform.forward()),
                    marker: NeedsEnemyTarget,
                },
            ))
            .id()
    }

    fn schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, target_finder_system).chain());
        schedule
    }

    #[test]
    fn test_opposing_agents_start_tracking() {
        let mut world = test_world();
        let blue = spawn_searcher(&mut world, 1, Faction::Blue, Vec3::ZERO, 0.0);
        let red = spawn_searcher(&mut world, 2, Faction::Red, Vec3::new(5.0, 0.0, 0.0), PI);

        schedule().run(&mut world);

        for (me, them) in [(blue, red), (red, blue)] {
            let entity = world.entity(me);
            assert!(entity.contains::<TrackingTarget>());
            assert!(!entity.contains::<NeedsEnemyTarget>());
            let record = entity.get::<TargetEntity>().unwrap();
            assert_eq!(record.entity, Some(them));
            assert!(record.vertical_aim_offset != 0.0);
        }
        assert_eq!(*world.resource::<FinderPhase>(), FinderPhase(1));
    }

    #[test]
    fn test_tracking_agents_are_not_searched() {
        let mut world = test_world();
        let blue = spawn_searcher(&mut world, 1, Faction::Blue, Vec3::ZERO, 0.0);
        spawn_searcher(&mut world, 2, Faction::Red, Vec3::new(5.0, 0.0, 0.0), PI);
        world.entity_mut(blue).remove::<NeedsEnemyTarget>();

        schedule().run(&mut world);

        let record = world.entity(blue).get::<TargetEntity>().unwrap();
        assert!(!record.has_target());
    }

    #[test]
    fn test_phase_advances_once_per_pass() {
        let mut world = test_world();
        for i in 0..20 {
            spawn_searcher(&mut world, i, Faction::Blue, Vec3::new(i as f32 * 3.0, 0.0, 0.0), PI / 2.0);
        }

        let mut schedule = schedule();
        for _ in 0..4 {
            schedule.run(&mut world);
        }
        assert_eq!(*world.resource::<FinderPhase>(), FinderPhase(4));
    }

    #[test]
    fn test_kill_switch_skips_pass() {
        let mut world = test_world();
        world.resource_mut::<TargetFinderConfig>().skip_finding_targets = true;
        let blue = spawn_searcher(&mut world, 1, Faction::Blue, Vec3::ZERO, 0.0);
        spawn_searcher(&mut world, 2, Faction::Red, Vec3::new(5.0, 0.0, 0.0), PI);

        schedule().run(&mut world);

        assert!(world.entity(blue).contains::<NeedsEnemyTarget>());
        assert_eq!(*world.resource::<FinderPhase>(), FinderPhase(0));
    }

    #[test]
    fn test_terrain_hides_enemy_and_sound_turns_agent() {
        let mut world = test_world();
        let mut terrain = TerrainGrid::new(50, 50, 2.0);
        terrain.set_terrain_at(6.0, 0.0, TerrainType::Building);
        world.insert_resource(terrain);
        let mut sounds = SoundField::default();
        sounds.emit(Vec3::new(0.0, 30.0, 0.0), Faction::Red, 100.0, 5.0);
        world.insert_resource(sounds);

        let blue = spawn_searcher(&mut world, 1, Faction::Blue, Vec3::ZERO, 0.0);
        world.spawn(AgentBundle::new(
            2,
            Faction::Red,
            UnitClass::Soldier,
            Transform::from_heading(Vec3::new(9.0, 0.0, 0.0), PI),
        ));

        schedule().run(&mut world);

        let entity = world.entity(blue);
        assert!(entity.contains::<NeedsEnemyTarget>());
        let mt = entity.get::<MoveTarget>().unwrap();
        assert_eq!(mt.action_id, 1);
        assert!((mt.forward - Vec3::Y).length() < 1.0e-5);
    }

    #[test]
    fn test_tracking_agents_age_their_cache() {
        let mut world = test_world();
        let blue = spawn_searcher(&mut world, 1, Faction::Blue, Vec3::ZERO, 0.0);
        let body = Capsule::new(Vec3::new(4.0, 0.0, 0.4), Vec3::new(4.0, 0.0, 1.4), 0.4);
        let phase_count = world.resource::<TargetFinderConfig>().phase_count;
        {
            let mut entity = world.entity_mut(blue);
            entity.remove::<NeedsEnemyTarget>().insert(TrackingTarget);
            let mut record = entity.get_mut::<TargetEntity>().unwrap();
            record.blocking.insert(body, phase_count);
        }

        let mut schedule = schedule();
        for _ in 1..phase_count {
            schedule.run(&mut world);
        }
        assert_eq!(world.entity(blue).get::<TargetEntity>().unwrap().blocking.live_count(), 1);

        schedule.run(&mut world);
        assert_eq!(world.entity(blue).get::<TargetEntity>().unwrap().blocking.live_count(), 0);
    }
}
