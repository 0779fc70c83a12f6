//! Target acquisition core.
//!
//! Per pass, every searching agent:
//! - picks one sub-cell of its search grid (`partition`)
//! - gathers the nearest occupants of that sub-cell (`proximity`)
//! - filters them down to one target (`eligibility`, backed by `blocking_cache`)
//! - solves the vertical aim offset for it (`ballistics`)
//! - or, with nothing to shoot at, turns toward hostile sounds (`audio`)
//!
//! `scheduler` runs that pipeline across workers.

pub mod audio;
pub mod ballistics;
pub mod blocking_cache;
pub mod eligibility;
pub mod partition;
pub mod proximity;
pub mod roster;
pub mod scheduler;

pub use audio::face_recent_sound;
pub use ballistics::{aim_offset_between, vertical_aim_offset};
pub use blocking_cache::{BlockingCache, BlockingEntry, BLOCKING_CACHE_CAPACITY};
pub use eligibility::{select_target, AcquiredTarget, FilterStats, Searcher};
pub use partition::search_area_for_phase;
pub use proximity::{find_close_entities, SortingCell};
pub use roster::{AgentRoster, AgentView};
pub use scheduler::{run_finder_pass, CompletionQueue, FinderJob, FinderPhase, PassContext, PassStats, WorkerScratch};
