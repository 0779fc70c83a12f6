//! Terrain heightmap used as the visibility probe.
//!
//! The terrain is a grid of cells, each with a ground height and a terrain
//! type. Forest and buildings stand above the ground and block line of sight
//! up to their obstruction height. Traces are sampled along the segment at
//! half-cell spacing.
//!
//! Traces run between world-space points. An agent's `Transform` Z is its
//! feet, so agents on raised ground must stand at `ground_position`, or their
//! firing lines start inside the hill.

use crate::perception::VisibilityProbe;
use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Terrain type at a grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainType {
    /// Open ground.
    #[default]
    Open,
    /// Tree canopy, blocks sight.
    Forest,
    /// Walls, blocks sight.
    Building,
}

impl TerrainType {
    /// Height above ground that this terrain occupies.
    pub fn obstruction_height(&self) -> f32 {
        match self {
            TerrainType::Forest => 12.0,
            TerrainType::Building => 8.0,
            TerrainType::Open => 0.0,
        }
    }
}

/// A single cell in the terrain grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    /// Ground height at this cell (0.0 = sea level).
    pub height: f32,
    pub terrain_type: TerrainType,
}

impl TerrainCell {
    /// Highest point of whatever occupies this cell.
    #[inline]
    pub fn obstruction_top(&self) -> f32 {
        self.height + self.terrain_type.obstruction_height()
    }
}

/// Grid-based terrain heightmap, centred on the world origin.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    /// Width of the grid in cells.
    pub width: usize,
    /// Height of the grid in cells.
    pub height: usize,
    /// Size of each cell in world units.
    pub cell_size: f32,
    /// Origin offset (world position of cell 0,0).
    pub origin_x: f32,
    pub origin_y: f32,
    /// Grid cells (row-major order).
    pub cells: Vec<TerrainCell>,
}

impl Default for TerrainGrid {
    fn default() -> Self {
        Self::new(100, 100, 10.0)
    }
}

impl TerrainGrid {
    /// Flat open terrain.
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        let origin_x = -(width as f32 * cell_size) / 2.0;
        let origin_y = -(height as f32 * cell_size) / 2.0;

        Self {
            width,
            height,
            cell_size,
            origin_x,
            origin_y,
            cells: vec![TerrainCell::default(); width * height],
        }
    }

    fn cell_index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn get_cell(&self, x: usize, y: usize) -> Option<&TerrainCell> {
        self.cell_index(x, y).map(|i| &self.cells[i])
    }

    pub fn get_cell_mut(&mut self, x: usize, y: usize) -> Option<&mut TerrainCell> {
        self.cell_index(x, y).map(|i| &mut self.cells[i])
    }

    /// Grid coordinates of a world position, or `None` off the map.
    pub fn world_to_grid(&self, world_x: f32, world_y: f32) -> Option<(usize, usize)> {
        let gx = ((world_x - self.origin_x) / self.cell_size).floor();
        let gy = ((world_y - self.origin_y) / self.cell_size).floor();
        if gx < 0.0 || gy < 0.0 || gx >= self.width as f32 || gy >= self.height as f32 {
            return None;
        }
        Some((gx as usize, gy as usize))
    }

    /// Cell at a world position. Off the map is flat open ground.
    pub fn get_terrain_at(&self, world_x: f32, world_y: f32) -> TerrainCell {
        self.world_to_grid(world_x, world_y)
            .and_then(|(gx, gy)| self.get_cell(gx, gy).copied())
            .unwrap_or_default()
    }

    pub fn get_height_at(&self, world_x: f32, world_y: f32) -> f32 {
        self.get_terrain_at(world_x, world_y).height
    }

    /// Point on the ground under `(world_x, world_y)`.
    pub fn ground_position(&self, world_x: f32, world_y: f32) -> Vec3 {
        Vec3::new(world_x, world_y, self.get_height_at(world_x, world_y))
    }

    /// Set the terrain type of the cell under a world position. Off the map is ignored.
    pub fn set_terrain_at(&mut self, world_x: f32, world_y: f32, terrain_type: TerrainType) {
        if let Some((gx, gy)) = self.world_to_grid(world_x, world_y) {
            if let Some(cell) = self.get_cell_mut(gx, gy) {
                cell.terrain_type = terrain_type;
            }
        }
    }

    pub fn set_height_at(&mut self, world_x: f32, world_y: f32, height: f32) {
        if let Some((gx, gy)) = self.world_to_grid(world_x, world_y) {
            if let Some(cell) = self.get_cell_mut(gx, gy) {
                cell.height = height;
            }
        }
    }
}

impl VisibilityProbe for TerrainGrid {
    fn trace_blocked(&self, start: Vec3, end: Vec3, radius: f32) -> bool {
        let horizontal = (end.truncate() - start.truncate()).length();
        let step = (self.cell_size * 0.5).max(f32::EPSILON);
        let samples = (horizontal / step).ceil() as usize;

        // Endpoints are excluded: agents standing in cover can still see out
        for i in 1..samples {
            let t = i as f32 / samples as f32;
            let point = start.lerp(end, t);
            let top = self.get_terrain_at(point.x, point.y).obstruction_top();
            if point.z - radius < top {
                return true;
            }
        }
        false
    }
}
