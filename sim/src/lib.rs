//! Mass Targeting - Target Acquisition Core
//!
//! Amortized, data-parallel target acquisition for large agent simulations.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod components;
pub mod config;
pub mod debug_draw;
pub mod geometry;
pub mod perception;
pub mod spatial;
pub mod systems;
pub mod targeting;
pub mod terrain;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{AgentArchetype, ConfigError, Gravity, TargetFinderConfig};
pub use debug_draw::{DebugDrawSink, DebugShape};
pub use geometry::{Capsule, Rect, SearchArea};
pub use perception::{ClearLineOfSight, SoundField, SoundPerception, VisibilityProbe};
pub use spatial::{MultiLevelGrid, SpatialIndex};
pub use systems::*;
pub use targeting::FinderPhase;
pub use terrain::{TerrainCell, TerrainGrid, TerrainType};
pub use world::{AgentSnapshot, Snapshot};
