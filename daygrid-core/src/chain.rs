//! Chain propagation for whole-cascade edits.
//!
//! Breadth-first: the queue holds spans that are now occupied. Every task a
//! span overlaps is pushed to abut it, and the block of pushed tasks is
//! queued in turn. Durations are preserved. Any push past the day edge
//! rejects the whole chain; a partial chain is never returned.

use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use std::collections::{HashSet, VecDeque};

use crate::bounds::DayBounds;
use crate::config::EngineConfig;
use crate::error::ChainError;
use crate::index::IntervalIndex;
use crate::task::{Task, TaskId, TaskUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDirection {
    /// Neighbours move before the mover (start edge dragged earlier).
    Earlier,
    /// Neighbours move after the mover (end edge dragged later).
    Later,
}

/// `initiating` carries its already-applied new start.
pub fn propagate_from_start_edit(
    tasks: &[Task],
    initiating: &Task,
    bounds: &DayBounds,
    config: &EngineConfig,
) -> Result<Vec<TaskUpdate>, ChainError> {
    propagate(tasks, initiating, PushDirection::Earlier, bounds, config)
}

/// `initiating` carries its already-applied new end.
pub fn propagate_from_end_edit(
    tasks: &[Task],
    initiating: &Task,
    bounds: &DayBounds,
    config: &EngineConfig,
) -> Result<Vec<TaskUpdate>, ChainError> {
    propagate(tasks, initiating, PushDirection::Later, bounds, config)
}

/// Whole-task move by `displacement`; `initiating` is already at its new
/// position. Moving later pushes neighbours later, moving earlier pushes them
/// earlier.
pub fn propagate_from_move(
    tasks: &[Task],
    initiating: &Task,
    displacement: Duration,
    bounds: &DayBounds,
    config: &EngineConfig,
) -> Result<Vec<TaskUpdate>, ChainError> {
    let direction = if displacement < Duration::zero() {
        PushDirection::Earlier
    } else {
        PushDirection::Later
    };
    propagate(tasks, initiating, direction, bounds, config)
}

pub fn propagate(
    tasks: &[Task],
    initiating: &Task,
    direction: PushDirection,
    bounds: &DayBounds,
    config: &EngineConfig,
) -> Result<Vec<TaskUpdate>, ChainError> {
    if !bounds.contains(initiating.start, initiating.end) {
        let attempted = match direction {
            PushDirection::Earlier => initiating.start,
            PushDirection::Later => initiating.end,
        };
        return Err(ChainError::CrossesDayBoundary {
            task_id: initiating.id.clone(),
            attempted,
        });
    }

    let index = IntervalIndex::build(tasks, Some(&initiating.id));
    let mut processed: HashSet<TaskId> = HashSet::new();
    let mut queue: VecDeque<(NaiveDateTime, NaiveDateTime)> = VecDeque::new();
    let mut updates: Vec<TaskUpdate> = Vec::new();
    let mut iterations = 0usize;

    queue.push_back((initiating.start, initiating.end));

    while let Some((span_start, span_end)) = queue.pop_front() {
        iterations += 1;
        if iterations > config.max_chain_iterations {
            warn!(
                "chain from {} exceeded {} iterations; rejecting",
                initiating.id, config.max_chain_iterations
            );
            return Err(ChainError::IterationCapExceeded {
                cap: config.max_chain_iterations,
            });
        }

        let mut displaced = index.query_overlapping(span_start, span_end, &processed);
        if displaced.is_empty() {
            continue;
        }

        // Nearest to the span first, so siblings stack outward.
        let block = match direction {
            PushDirection::Later => {
                let mut frontier = span_end;
                for n in displaced {
                    let new_start = frontier;
                    let new_end = new_start + n.duration();
                    if new_end > bounds.end {
                        debug!("chain from {}: {} would end at {new_end}", initiating.id, n.id);
                        return Err(ChainError::CrossesDayBoundary {
                            task_id: n.id.clone(),
                            attempted: new_end,
                        });
                    }
                    processed.insert(n.id.clone());
                    updates.push(TaskUpdate::new(n.id.clone(), new_start, new_end));
                    frontier = new_end;
                }
                (span_end, frontier)
            }
            PushDirection::Earlier => {
                displaced.sort_by(|a, b| b.end.cmp(&a.end).then_with(|| a.id.cmp(&b.id)));
                let mut frontier = span_start;
                for n in displaced {
                    let new_end = frontier;
                    let new_start = new_end - n.duration();
                    if new_start < bounds.start {
                        debug!("chain from {}: {} would start at {new_start}", initiating.id, n.id);
                        return Err(ChainError::CrossesDayBoundary {
                            task_id: n.id.clone(),
                            attempted: new_start,
                        });
                    }
                    processed.insert(n.id.clone());
                    updates.push(TaskUpdate::new(n.id.clone(), new_start, new_end));
                    frontier = new_start;
                }
                (frontier, span_start)
            }
        };

        queue.push_back(block);
    }

    debug!(
        "chain from {} complete: {} updates in {} iterations",
        initiating.id,
        updates.len(),
        iterations
    );
    Ok(updates)
}
