use chrono::NaiveDateTime;
use thiserror::Error;

use crate::task::TaskId;

/// Why a chain propagation was rejected. No updates are produced in either
/// case; the caller should snap the edit back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("pushing task {task_id} would cross the day boundary (to {attempted})")]
    CrossesDayBoundary {
        task_id: TaskId,
        attempted: NaiveDateTime,
    },
    #[error("chain propagation exceeded {cap} iterations")]
    IterationCapExceeded { cap: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no free slot of {duration_minutes} min for task {task_id}")]
    NoFreeSlot {
        task_id: TaskId,
        duration_minutes: i64,
    },
    #[error("task {task_id} needs a positive duration, got {duration_minutes} min")]
    InvalidDuration {
        task_id: TaskId,
        duration_minutes: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
