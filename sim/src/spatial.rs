//! Multi-resolution spatial partitioning for proximity queries.
//!
//! Agents are hashed into square cells on one of several levels. Small bodies
//! live on the finest level, large bodies on coarser ones, so a query only has
//! to look at a handful of cells per level instead of the whole population.
//!
//! The target finder only consumes the grid through the `SpatialIndex` trait.

use crate::components::{AgentBody, Faction, Transform, UnitClass};
use crate::geometry::Rect;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::collections::HashMap;

/// Each level's cells are this many times wider than the previous level's.
const LEVEL_SCALE: f32 = 4.0;

/// A cell address on one level of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub level: u8,
}

/// Inclusive range of cell coordinates on one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl CellRange {
    pub fn cells(&self, level: u8) -> impl Iterator<Item = GridCell> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| GridCell { x, y, level }))
    }
}

/// Read-only view of a multi-level spatial hash.
pub trait SpatialIndex: Sync {
    fn num_levels(&self) -> usize;

    fn cell_size(&self, level: usize) -> f32;

    /// Occupants of one cell, in insertion order.
    fn occupants(&self, cell: GridCell) -> &[Entity];

    /// Cells of `level` overlapped by `bounds`.
    fn cell_range(&self, bounds: &Rect, level: usize) -> CellRange {
        let size = self.cell_size(level);
        CellRange {
            min_x: (bounds.min.x / size).floor() as i32,
            min_y: (bounds.min.y / size).floor() as i32,
            max_x: (bounds.max.x / size).floor() as i32,
            max_y: (bounds.max.y / size).floor() as i32,
        }
    }

    /// World-space centre of a cell.
    fn cell_center(&self, cell: GridCell) -> (f32, f32) {
        let size = self.cell_size(cell.level as usize);
        ((cell.x as f32 + 0.5) * size, (cell.y as f32 + 0.5) * size)
    }
}

/// Grid-based multi-level spatial hash.
#[derive(Resource, Debug)]
pub struct MultiLevelGrid {
    /// Cell size of level 0 in world units.
    base_cell_size: f32,
    levels: usize,
    /// Map from cell address to the entities in that cell.
    cells: HashMap<GridCell, Vec<Entity>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, GridCell>,
}

impl Default for MultiLevelGrid {
    fn default() -> Self {
        Self::new(10.0, 3)
    }
}

impl MultiLevelGrid {
    pub fn new(base_cell_size: f32, levels: usize) -> Self {
        Self {
            base_cell_size,
            levels: levels.max(1),
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    /// Finest level whose cells are at least twice the body's diameter.
    pub fn level_for_radius(&self, radius: f32) -> usize {
        let diameter = radius * 2.0;
        (0..self.levels)
            .find(|&level| self.cell_size(level) >= diameter * 2.0)
            .unwrap_or(self.levels - 1)
    }

    #[inline]
    pub fn world_to_cell(&self, x: f32, y: f32, level: usize) -> GridCell {
        let size = self.cell_size(level);
        GridCell {
            x: (x / size).floor() as i32,
            y: (y / size).floor() as i32,
            level: level as u8,
        }
    }

    /// Clear all entries (call at start of each frame before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Insert an entity, or move it if already present.
    pub fn insert(&mut self, entity: Entity, position: Vec3, radius: f32) {
        let level = self.level_for_radius(radius);
        let cell = self.world_to_cell(position.x, position.y, level);

        if let Some(&old_cell) = self.entity_cells.get(&entity) {
            if old_cell == cell {
                return;
            }
            if let Some(entries) = self.cells.get_mut(&old_cell) {
                entries.retain(|e| *e != entity);
            }
        }

        self.cells.entry(cell).or_default().push(entity);
        self.entity_cells.insert(entity, cell);
    }

    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| *e != entity);
            }
        }
    }

    pub fn cell_of(&self, entity: Entity) -> Option<GridCell> {
        self.entity_cells.get(&entity).copied()
    }

    pub fn cell_count(&self, cell: GridCell) -> usize {
        self.cells.get(&cell).map(|v| v.len()).unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }
}

impl SpatialIndex for MultiLevelGrid {
    fn num_levels(&self) -> usize {
        self.levels
    }

    fn cell_size(&self, level: usize) -> f32 {
        self.base_cell_size * LEVEL_SCALE.powi(level as i32)
    }

    fn occupants(&self, cell: GridCell) -> &[Entity] {
        self.cells.get(&cell).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// System that rebuilds the spatial grid each frame.
pub fn spatial_grid_update_system(
    mut grid: ResMut<MultiLevelGrid>,
    query: Query<(Entity, &Transform, Option<&AgentBody>, Option<&UnitClass>), With<Faction>>,
) {
    grid.clear();

    for (entity, transform, body, class) in query.iter() {
        let radius = body
            .copied()
            .unwrap_or_else(|| class.copied().unwrap_or_default().default_body())
            .radius;
        grid.insert(entity, transform.translation, radius);
    }
}
