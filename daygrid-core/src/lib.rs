//! daygrid-core: conflict resolution and placement for tasks on a single day.
//!
//! The engine never owns the task set. Every operation reads a snapshot and
//! returns update instructions that the caller applies in order.

pub mod bounds;
pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod index;
pub mod overlap;
pub mod placement;
pub mod session;
pub mod task;
pub mod time;

pub use bounds::{
    DayBounds, Violation, clamp_end_edge, clamp_start_edge, day_bounds_for, is_slot_free, validate_day,
};
pub use cache::{CacheStats, PlacementCache};
pub use chain::{PushDirection, propagate_from_end_edit, propagate_from_move, propagate_from_start_edit};
pub use config::EngineConfig;
pub use error::{ChainError, EngineError, PlacementError};
pub use index::IntervalIndex;
pub use overlap::{EditPlan, on_end_boundary_changed, on_start_boundary_changed};
pub use placement::{PlacementOptimizer, Slot, free_gaps, free_slots};
pub use session::EditSession;
pub use task::{Appearance, Task, TaskId, TaskUpdate, apply_updates};
