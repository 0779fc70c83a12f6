//! Configuration for the target finder and per-archetype registration data.
//!
//! `TargetFinderConfig` is a resource holding the tuning that is shared by
//! every agent. `AgentArchetype` is what an agent type declares when it gains
//! the "needs target" capability. Both load from JSON and are validated before
//! they reach the simulation; a bad value is a `ConfigError`, never a panic in
//! the middle of a pass.

use crate::components::{SearchParameters, TargetEntity};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("search breadth must be at least 1")]
    ZeroBreadth,
    #[error("search breadth {breadth} needs {cells} sub-cells, which does not divide the phase count {phase_count}")]
    BreadthMismatch { breadth: u8, cells: u16, phase_count: u8 },
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("phase count must be at least 1")]
    ZeroPhaseCount,
    #[error("minimum caliber must be finite and non-negative, got {0}")]
    InvalidCaliber(f32),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shared tuning for the target finder.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetFinderConfig {
    /// Fixed timestep in seconds (e.g., 1/30 = 0.0333 for 30 Hz).
    pub fixed_timestep: f32,
    /// Length of the sub-cell rotation. Cached blockers live this many passes.
    pub phase_count: u8,
    /// Side length of one search sub-cell in world units.
    pub sub_cell_size: f32,
    /// Candidates gathered per agent per pass.
    pub max_candidates: usize,
    /// Radius of the firing-line capsule.
    pub projectile_radius: f32,
    /// Extra height above the feet when a vehicle aims at a soldier.
    pub feet_clearance: f32,
    /// Radius of the swept visibility trace.
    pub trace_radius: f32,
    /// Cell size of the finest spatial grid level.
    pub grid_base_cell_size: f32,
    pub grid_levels: usize,
    /// Run worker ranges on the rayon pool instead of inline.
    pub use_parallel: bool,
    /// Kill switch: skip target finding entirely.
    pub skip_finding_targets: bool,
    pub draw_entities_searching: bool,
    pub draw_tracked_sounds: bool,
}

impl Default for TargetFinderConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 30.0,
            phase_count: 9,
            sub_cell_size: 20.0,
            max_candidates: 10,
            projectile_radius: 0.1,
            feet_clearance: 0.5,
            trace_radius: 0.2,
            grid_base_cell_size: 10.0,
            grid_levels: 3,
            use_parallel: true,
            skip_finding_targets: false,
            draw_entities_searching: false,
            draw_tracked_sounds: false,
        }
    }
}

impl TargetFinderConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phase_count == 0 {
            return Err(ConfigError::ZeroPhaseCount);
        }
        for (name, value) in [
            ("fixed_timestep", self.fixed_timestep),
            ("sub_cell_size", self.sub_cell_size),
            ("grid_base_cell_size", self.grid_base_cell_size),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Signed vertical acceleration applied to projectiles.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Gravity(pub f32);

impl Default for Gravity {
    fn default() -> Self {
        Self(-9.81)
    }
}

/// Registration data for an agent type that needs targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentArchetype {
    /// Sub-cell grid dimension.
    pub breadth: u8,
    /// Minimum damage rating a target must have.
    pub min_caliber: f32,
    pub worker_count: usize,
    pub draw_search_areas: bool,
}

impl Default for AgentArchetype {
    fn default() -> Self {
        Self {
            breadth: 3,
            min_caliber: 1.0,
            worker_count: 4,
            draw_search_areas: false,
        }
    }
}

impl AgentArchetype {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self, config: &TargetFinderConfig) -> Result<(), ConfigError> {
        if self.breadth == 0 {
            return Err(ConfigError::ZeroBreadth);
        }
        let cells = u16::from(self.breadth) * u16::from(self.breadth);
        if u16::from(config.phase_count) % cells != 0 {
            return Err(ConfigError::BreadthMismatch {
                breadth: self.breadth,
                cells,
                phase_count: config.phase_count,
            });
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if !self.min_caliber.is_finite() || self.min_caliber < 0.0 {
            return Err(ConfigError::InvalidCaliber(self.min_caliber));
        }
        Ok(())
    }

    pub fn target_entity(&self) -> TargetEntity {
        TargetEntity::new(self.min_caliber, self.breadth)
    }

    pub fn search_parameters(&self) -> SearchParameters {
        SearchParameters {
            worker_count: self.worker_count,
            draw_search_areas: self.draw_search_areas,
        }
    }
}
