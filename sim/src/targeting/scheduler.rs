//! Data-parallel target finding pass.
//!
//! ## Phases
//!
//! 1. **Extract** - the calling system copies every searching agent into a
//!    `FinderJob`. Workers never touch ECS storage.
//! 2. **Compute** - jobs are grouped by `SearchParameters`, each group is cut
//!    into `worker_count` contiguous ranges of `ceil(n / worker_count)` and the
//!    ranges run on the rayon pool. A worker owns its range exclusively and
//!    keeps a private candidate buffer. Agents that acquire a target are
//!    pushed onto the shared completion queue.
//! 3. **Apply** - back on the calling thread, jobs are written back to their
//!    components and the queue is drained into deferred commands.
//!
//! Collaborators (`SpatialIndex`, `VisibilityProbe`, `SoundPerception`) are
//! read-only for the whole compute phase.

use crate::components::{Faction, MoveTarget, SearchParameters, TargetEntity, Transform, UnitClass};
use crate::config::TargetFinderConfig;
use crate::debug_draw::{DebugDrawSink, DebugShape};
use crate::perception::{SoundPerception, VisibilityProbe};
use crate::spatial::SpatialIndex;
use crate::targeting::audio::face_recent_sound;
use crate::targeting::ballistics::aim_offset_between;
use crate::targeting::eligibility::{select_target, FilterStats, Searcher};
use crate::targeting::partition::search_area_for_phase;
use crate::targeting::proximity::{find_close_entities, SortingCell};
use crate::targeting::roster::AgentRoster;
use bevy_ecs::prelude::*;
use std::sync::Mutex;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Shared sub-cell index, advanced once per pass.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinderPhase(pub u8);

impl FinderPhase {
    pub fn advance(&mut self, phase_count: u8) {
        let count = u16::from(phase_count.max(1));
        self.0 = ((u16::from(self.0) + 1) % count) as u8;
    }
}

/// One searching agent, extracted for the compute phase.
#[derive(Debug, Clone)]
pub struct FinderJob {
    pub entity: Entity,
    pub transform: Transform,
    pub faction: Faction,
    pub class: UnitClass,
    pub parameters: SearchParameters,
    pub record: TargetEntity,
    pub move_target: Option<MoveTarget>,
}

/// Everything a worker reads during a pass.
pub struct PassContext<'a> {
    pub index: &'a dyn SpatialIndex,
    pub roster: &'a AgentRoster,
    pub sounds: &'a dyn SoundPerception,
    pub probe: &'a dyn VisibilityProbe,
    pub config: &'a TargetFinderConfig,
    pub gravity_z: f32,
    pub phase: u8,
    pub debug: &'a DebugDrawSink,
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub searched: u32,
    pub acquired: u32,
    pub turned_to_sound: u32,
    pub candidates: u32,
    pub filter: FilterStats,
}

impl PassStats {
    pub fn merge(&mut self, other: &PassStats) {
        self.searched += other.searched;
        self.acquired += other.acquired;
        self.turned_to_sound += other.turned_to_sound;
        self.candidates += other.candidates;
        self.filter.merge(&other.filter);
    }
}

/// Completion queue: many workers push, the scheduler thread drains.
#[derive(Debug, Default)]
pub struct CompletionQueue {
    acquired: Mutex<Vec<Entity>>,
}

impl CompletionQueue {
    pub fn push_all(&self, entities: &[Entity]) {
        if entities.is_empty() {
            return;
        }
        let mut queue = match self.acquired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.extend_from_slice(entities);
    }

    pub fn drain(self) -> Vec<Entity> {
        match self.acquired.into_inner() {
            Ok(queue) => queue,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Run the compute phase over `jobs`.
///
/// Jobs are reordered so agents sharing `SearchParameters` are contiguous.
/// Returns the pass counters; acquired agents end up in `queue`.
pub fn run_finder_pass(jobs: &mut [FinderJob], ctx: &PassContext, queue: &CompletionQueue) -> PassStats {
    jobs.sort_by_key(|job| (job.parameters.worker_count, job.parameters.draw_search_areas));

    let mut stats = PassStats::default();
    for group in jobs.chunk_by_mut(|a, b| a.parameters == b.parameters) {
        let workers = group[0].parameters.worker_count.max(1);
        let range_len = group.len().div_ceil(workers);
        let partial = run_group(group, range_len, ctx, queue);
        stats.merge(&partial);
    }
    stats
}

fn run_group(group: &mut [FinderJob], range_len: usize, ctx: &PassContext, queue: &CompletionQueue) -> PassStats {
    #[cfg(feature = "parallel")]
    if ctx.config.use_parallel {
        return group
            .par_chunks_mut(range_len)
            .map(|range| process_range(range, ctx, queue))
            .reduce(PassStats::default, |mut a, b| {
                a.merge(&b);
                a
            });
    }

    group
        .chunks_mut(range_len)
        .map(|range| process_range(range, ctx, queue))
        .fold(PassStats::default(), |mut a, b| {
            a.merge(&b);
            a
        })
}

/// Buffers owned by one worker and reused for every agent in its range.
#[derive(Debug, Default)]
pub struct WorkerScratch {
    pub cells: Vec<SortingCell>,
    pub candidates: Vec<Entity>,
}

impl WorkerScratch {
    pub fn with_capacity(max_candidates: usize) -> Self {
        Self {
            cells: Vec::new(),
            candidates: Vec::with_capacity(max_candidates),
        }
    }
}

/// One worker's contiguous range.
fn process_range(range: &mut [FinderJob], ctx: &PassContext, queue: &CompletionQueue) -> PassStats {
    let mut stats = PassStats::default();
    let mut scratch = WorkerScratch::with_capacity(ctx.config.max_candidates);
    let mut acquired = Vec::new();

    for job in range.iter_mut() {
        if process_agent(job, ctx, &mut scratch, &mut stats) {
            acquired.push(job.entity);
        }
    }

    queue.push_all(&acquired);
    stats
}

/// Query, filter, solve and fall back for a single agent.
///
/// Returns true if the agent acquired a target this pass.
pub fn process_agent(job: &mut FinderJob, ctx: &PassContext, scratch: &mut WorkerScratch, stats: &mut PassStats) -> bool {
    let config = ctx.config;
    stats.searched += 1;
    job.record.blocking.decay();

    let area = search_area_for_phase(ctx.phase, &job.transform, job.record.search_breadth, config.sub_cell_size);
    find_close_entities(&area, ctx.index, config.max_candidates, &mut scratch.cells, &mut scratch.candidates);
    stats.candidates += scratch.candidates.len() as u32;

    if job.parameters.draw_search_areas {
        ctx.debug.emit(DebugShape::SearchArea {
            area,
            phase: ctx.phase,
            candidates: scratch.candidates.len(),
        });
    }
    if config.draw_entities_searching {
        ctx.debug.emit(DebugShape::Searching {
            position: job.transform.translation,
        });
    }

    let searcher = Searcher {
        entity: job.entity,
        transform: job.transform,
        faction: job.faction,
        class: job.class,
        min_caliber: job.record.min_caliber,
    };

    if let Some(target) = select_target(
        &searcher,
        &scratch.candidates,
        ctx.roster,
        ctx.probe,
        &mut job.record.blocking,
        config,
        &mut stats.filter,
    ) {
        let offset = aim_offset_between(target.firing_line.a, target.firing_line.b, job.class, ctx.gravity_z);
        job.record.entity = Some(target.entity);
        job.record.vertical_aim_offset = offset;
        stats.acquired += 1;
        trace!(agent = ?job.entity, target = ?target.entity, vertical_aim_offset = offset, "target_acquired");
        return true;
    }

    if let Some(move_target) = job.move_target.as_mut() {
        if let Some(source) = face_recent_sound(&job.transform, job.faction, move_target, ctx.sounds) {
            stats.turned_to_sound += 1;
            if config.draw_tracked_sounds {
                ctx.debug.emit(DebugShape::SoundHeading {
                    from: job.transform.translation,
                    to: source,
                });
            }
        }
    }

    false
}
