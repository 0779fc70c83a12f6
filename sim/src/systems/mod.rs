//! ECS Systems for the target acquisition simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## System Ordering
//!
//! One fixed update runs, in order:
//! - `spatial_grid_update_system` - Rebuilds the multi-level grid
//! - `sound_decay_system` - Forgets old sounds
//! - `target_validation_system` - Releases targets that no longer exist
//! - `target_finder_system` - Runs one acquisition pass and advances the phase
//! - `tick_system` - Advances the tick counter
//!
//! Marker transitions are deferred and applied at the end of the schedule.

pub mod clock;
pub mod serialization;
pub mod target_finder;
pub mod target_validation;

pub use clock::*;
pub use serialization::*;
pub use target_finder::*;
pub use target_validation::*;
