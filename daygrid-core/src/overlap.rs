//! Per-frame edge drag handling.
//!
//! Unlike [`crate::chain`], this never walks the whole cascade. Each task the
//! edited task now overlaps is resolved on its own:
//! - shift it to abut the edited task, if that spot is in the day and clear
//! - else compress it against the day edge, if that leaves `min_duration`
//! - else hand it to the placement search
//!
//! Every candidate position is checked against the day as already rewritten
//! by earlier decisions in the same call, so applying the result never
//! reintroduces an overlap.

use chrono::NaiveDateTime;
use log::debug;
use std::collections::HashSet;

use crate::bounds::{DayBounds, clamp_end_edge, clamp_start_edge};
use crate::chain::PushDirection;
use crate::error::EngineError;
use crate::index::IntervalIndex;
use crate::placement::PlacementOptimizer;
use crate::task::{Task, TaskId, TaskUpdate, apply_updates};

/// Result of one edit: the edited task's committed bounds plus the ripple on
/// its neighbours, to be applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct EditPlan {
    pub edited: TaskUpdate,
    pub ripple: Vec<TaskUpdate>,
}

impl EditPlan {
    pub fn updates(&self) -> impl Iterator<Item = &TaskUpdate> {
        std::iter::once(&self.edited).chain(self.ripple.iter())
    }

    pub fn apply(&self, tasks: &mut [Task]) -> usize {
        let all: Vec<TaskUpdate> = self.updates().cloned().collect();
        apply_updates(tasks, &all)
    }
}

/// The edited task's start moved to `new_start`.
pub fn on_start_boundary_changed(
    tasks: &[Task],
    edited_id: &TaskId,
    new_start: NaiveDateTime,
    bounds: &DayBounds,
    optimizer: &mut PlacementOptimizer,
) -> Result<EditPlan, EngineError> {
    let original = find(tasks, edited_id)?;
    let start = clamp_start_edge(original, new_start, bounds, optimizer.config().min_duration());
    resolve(tasks, original, start, original.end, PushDirection::Earlier, bounds, optimizer)
}

/// The edited task's end moved to `new_end`.
pub fn on_end_boundary_changed(
    tasks: &[Task],
    edited_id: &TaskId,
    new_end: NaiveDateTime,
    bounds: &DayBounds,
    optimizer: &mut PlacementOptimizer,
) -> Result<EditPlan, EngineError> {
    let original = find(tasks, edited_id)?;
    let end = clamp_end_edge(original, new_end, bounds, optimizer.config().min_duration());
    resolve(tasks, original, original.start, end, PushDirection::Later, bounds, optimizer)
}

fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Result<&'a Task, EngineError> {
    tasks
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| EngineError::UnknownTask(id.clone()))
}

fn resolve(
    tasks: &[Task],
    original: &Task,
    start: NaiveDateTime,
    end: NaiveDateTime,
    direction: PushDirection,
    bounds: &DayBounds,
    optimizer: &mut PlacementOptimizer,
) -> Result<EditPlan, EngineError> {
    let edited = TaskUpdate::new(original.id.clone(), start, end);
    let min = optimizer.config().min_duration();

    let mut working: Vec<Task> = tasks.to_vec();
    apply_updates(&mut working, std::slice::from_ref(&edited));

    let index = IntervalIndex::build(tasks, Some(&original.id));
    let mut neighbours = index.query_overlapping(start, end, &HashSet::new());
    if direction == PushDirection::Earlier {
        neighbours.sort_by(|a, b| b.end.cmp(&a.end).then_with(|| a.id.cmp(&b.id)));
    }

    // Neighbours not yet resolved will move anyway; their old spots don't block.
    let mut pending: HashSet<TaskId> = neighbours.iter().map(|t| t.id.clone()).collect();
    let mut frontier = match direction {
        PushDirection::Earlier => start,
        PushDirection::Later => end,
    };
    let mut ripple: Vec<TaskUpdate> = Vec::new();

    for n in neighbours {
        pending.remove(&n.id);
        let duration = n.duration();
        let clear = |s: NaiveDateTime, e: NaiveDateTime, working: &[Task]| {
            bounds.contains(s, e)
                && !working
                    .iter()
                    .any(|t| t.id != n.id && !pending.contains(&t.id) && t.overlaps(s, e))
        };

        let (ideal_start, ideal_end) = match direction {
            PushDirection::Earlier => (frontier - duration, frontier),
            PushDirection::Later => (frontier, frontier + duration),
        };

        let (new_start, new_end) = if clear(ideal_start, ideal_end, &working) {
            debug!("shift {} to {ideal_start}-{ideal_end}", n.id);
            frontier = match direction {
                PushDirection::Earlier => ideal_start,
                PushDirection::Later => ideal_end,
            };
            (ideal_start, ideal_end)
        } else {
            let squeezed = match direction {
                PushDirection::Earlier => (bounds.start, frontier),
                PushDirection::Later => (frontier, bounds.end),
            };
            let hits_day_edge = !bounds.contains(ideal_start, ideal_end);
            if hits_day_edge && squeezed.1 - squeezed.0 >= min && clear(squeezed.0, squeezed.1, &working) {
                debug!("compress {} to {}-{}", n.id, squeezed.0, squeezed.1);
                frontier = match direction {
                    PushDirection::Earlier => squeezed.0,
                    PushDirection::Later => squeezed.1,
                };
                squeezed
            } else {
                let slot = optimizer.find_placement(&working, &n.id, ideal_start, duration, bounds)?;
                debug!("relocate {} to {}-{}", n.id, slot.start, slot.end);
                (slot.start, slot.end)
            }
        };

        let update = TaskUpdate::new(n.id.clone(), new_start, new_end);
        apply_updates(&mut working, std::slice::from_ref(&update));
        ripple.push(update);
    }

    Ok(EditPlan { edited, ripple })
}
