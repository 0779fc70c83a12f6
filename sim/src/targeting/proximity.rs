//! Approximate nearest-first occupant query over the spatial index.
//!
//! Cells overlapping the search area are visited in order of their centre's
//! distance to the area's centre, on every level of the index, and their
//! occupants are appended until `max_results` are collected. Ordering is by
//! cell, not by occupant position, so the result approximates the true
//! nearest K.

use crate::geometry::SearchArea;
use crate::spatial::{GridCell, SpatialIndex};
use bevy_ecs::entity::Entity;

/// A cell queued for visiting, keyed by its distance to the area centre.
#[derive(Debug, Clone, Copy)]
pub struct SortingCell {
    cell: GridCell,
    sq_dist: f32,
}

/// Fill `out` with up to `max_results` occupants of `area`, nearest cells first.
///
/// `cells` and `out` are cleared first; callers keep both as per-worker
/// scratch space.
pub fn find_close_entities(
    area: &SearchArea,
    index: &dyn SpatialIndex,
    max_results: usize,
    cells: &mut Vec<SortingCell>,
    out: &mut Vec<Entity>,
) {
    out.clear();
    cells.clear();
    if max_results == 0 {
        return;
    }

    let bounds = area.bounds();
    let center = area.center;

    for level in 0..index.num_levels() {
        let range = index.cell_range(&bounds, level);
        for cell in range.cells(level as u8) {
            let (cx, cy) = index.cell_center(cell);
            let dx = cx - center.x;
            let dy = cy - center.y;
            cells.push(SortingCell {
                cell,
                sq_dist: dx * dx + dy * dy,
            });
        }
    }

    // Stable sort keeps level/row/column order among equidistant cells
    cells.sort_by(|a, b| a.sq_dist.total_cmp(&b.sq_dist));

    for sorted in cells.iter() {
        for &entity in index.occupants(sorted.cell) {
            out.push(entity);
            if out.len() >= max_results {
                return;
            }
        }
    }
}
