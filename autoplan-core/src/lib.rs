//! autoplan-core: task dependency graph, capacity scheduler and conflict detector.
//!
//! Everything in this crate is a pure function of its inputs. Callers own
//! persistence, clocks and concurrency; the engine only reads snapshots and
//! returns new values.

pub mod busy;
pub mod conflicts;
pub mod error;
pub mod graph;
pub mod options;
pub mod scheduler;
pub mod task;
pub mod time;

pub use busy::{busy_minutes_on, can_schedule_at, clashing_block, free_slots, BusyTimeBlock, FreeSlot};
pub use conflicts::{
    conflict_summary, detect_conflicts, suggestions, Conflict, ConflictDetector, ConflictLevel,
    ConflictSeverity, TimeWindow,
};
pub use error::{CircularDependencyError, DependencyError};
pub use graph::{can_start, try_add_dependency, unlocked_tasks, would_create_cycle, DependencyGraph, EdgeAdded};
pub use options::PlanningOptions;
pub use scheduler::{
    autoplan, daily_duration, is_overloaded, weekly_load, AutoplanOutcome, CapacityScheduler, DayLoad,
    Unscheduled, UnscheduledReason,
};
pub use task::{Category, Priority, Task, TaskId};
