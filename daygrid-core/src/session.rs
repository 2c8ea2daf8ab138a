//! EditSession: one editing session on one day.
//!
//! Owns the placement cache for as long as the user keeps editing the same
//! day; dropping the session drops the cache. The task set itself always
//! stays with the caller and is passed in on every call.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::bounds::{DayBounds, clamp_end_edge, clamp_start_edge, day_bounds_for};
use crate::cache::CacheStats;
use crate::chain;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::overlap::{self, EditPlan};
use crate::placement::{PlacementOptimizer, Slot};
use crate::task::{Task, TaskId, TaskUpdate};

#[derive(Debug, Clone)]
pub struct EditSession {
    bounds: DayBounds,
    optimizer: PlacementOptimizer,
}

impl EditSession {
    pub fn new(date: NaiveDate, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            bounds: day_bounds_for(date),
            optimizer: PlacementOptimizer::new(config),
        })
    }

    pub fn bounds(&self) -> &DayBounds {
        &self.bounds
    }

    pub fn config(&self) -> &EngineConfig {
        self.optimizer.config()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.optimizer.cache().stats()
    }

    /// Per-frame start edge drag.
    pub fn drag_start_edge(
        &mut self,
        tasks: &[Task],
        id: &TaskId,
        new_start: NaiveDateTime,
    ) -> Result<EditPlan, EngineError> {
        overlap::on_start_boundary_changed(tasks, id, new_start, &self.bounds, &mut self.optimizer)
    }

    /// Per-frame end edge drag.
    pub fn drag_end_edge(
        &mut self,
        tasks: &[Task],
        id: &TaskId,
        new_end: NaiveDateTime,
    ) -> Result<EditPlan, EngineError> {
        overlap::on_end_boundary_changed(tasks, id, new_end, &self.bounds, &mut self.optimizer)
    }

    /// Start edge edit that pushes the full chain of neighbours earlier.
    /// The edge is clamped like [`Self::drag_start_edge`].
    pub fn cascade_start_edge(
        &self,
        tasks: &[Task],
        id: &TaskId,
        new_start: NaiveDateTime,
    ) -> Result<EditPlan, EngineError> {
        let original = find(tasks, id)?;
        let start = clamp_start_edge(original, new_start, &self.bounds, self.config().min_duration());
        let edited = original.clone().with_bounds(start, original.end);
        let ripple = chain::propagate_from_start_edit(tasks, &edited, &self.bounds, self.config())?;
        Ok(plan_for(&edited, ripple))
    }

    /// End edge edit that pushes the full chain of neighbours later.
    /// The edge is clamped like [`Self::drag_end_edge`].
    pub fn cascade_end_edge(
        &self,
        tasks: &[Task],
        id: &TaskId,
        new_end: NaiveDateTime,
    ) -> Result<EditPlan, EngineError> {
        let original = find(tasks, id)?;
        let end = clamp_end_edge(original, new_end, &self.bounds, self.config().min_duration());
        let edited = original.clone().with_bounds(original.start, end);
        let ripple = chain::propagate_from_end_edit(tasks, &edited, &self.bounds, self.config())?;
        Ok(plan_for(&edited, ripple))
    }

    /// Whole-task move keeping its duration; neighbours cascade.
    pub fn move_task(
        &self,
        tasks: &[Task],
        id: &TaskId,
        new_start: NaiveDateTime,
    ) -> Result<EditPlan, EngineError> {
        let original = find(tasks, id)?;
        let displacement: Duration = new_start - original.start;
        let moved = original
            .clone()
            .with_bounds(new_start, new_start + original.duration());
        let ripple = chain::propagate_from_move(tasks, &moved, displacement, &self.bounds, self.config())?;
        Ok(plan_for(&moved, ripple))
    }

    /// Free slot for `id` (which need not exist yet) near `preferred_start`.
    pub fn place(
        &mut self,
        tasks: &[Task],
        id: &TaskId,
        preferred_start: NaiveDateTime,
        duration: Duration,
    ) -> Result<Slot, EngineError> {
        Ok(self
            .optimizer
            .find_placement(tasks, id, preferred_start, duration, &self.bounds)?)
    }
}

fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Result<&'a Task, EngineError> {
    tasks
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| EngineError::UnknownTask(id.clone()))
}

fn plan_for(edited: &Task, ripple: Vec<TaskUpdate>) -> EditPlan {
    EditPlan {
        edited: TaskUpdate::new(edited.id.clone(), edited.start, edited.end),
        ripple,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::validate_day;
    use crate::error::ChainError;
    use crate::time::{at, test_day};

    fn abc() -> Vec<Task> {
        vec![
            Task::new("a", "a", at(9, 0), at(10, 0)),
            Task::new("b", "b", at(10, 0), at(11, 0)),
            Task::new("c", "c", at(11, 0), at(12, 0)),
        ]
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let cfg = EngineConfig {
            cache_max_size: 0,
            ..EngineConfig::default()
        };
        assert!(EditSession::new(test_day(), cfg).is_err());
    }

    #[test]
    fn test_cascade_end_edge_applies_cleanly() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let mut tasks = abc();
        let plan = session.cascade_end_edge(&tasks, &"a".into(), at(10, 30)).unwrap();
        assert_eq!(plan.apply(&mut tasks), 3);
        assert_eq!(tasks[1].start, at(10, 30));
        assert_eq!(tasks[2].end, at(12, 30));
    }

    #[test]
    fn test_cascade_start_edge_pushes_earlier() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let plan = session.cascade_start_edge(&abc(), &"b".into(), at(9, 30)).unwrap();
        assert_eq!(plan.edited, TaskUpdate::new("b".into(), at(9, 30), at(11, 0)));
        assert_eq!(plan.ripple, vec![TaskUpdate::new("a".into(), at(8, 30), at(9, 30))]);
    }

    #[test]
    fn test_cascade_shrink_keeps_min_duration() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let mut tasks = abc();

        let plan = session.cascade_end_edge(&tasks, &"a".into(), at(9, 5)).unwrap();
        assert_eq!(plan.edited, TaskUpdate::new("a".into(), at(9, 0), at(9, 15)));
        assert!(plan.ripple.is_empty());
        plan.apply(&mut tasks);
        assert!(validate_day(&tasks, session.bounds(), session.config()).is_empty());

        let plan = session.cascade_start_edge(&abc(), &"a".into(), at(9, 55)).unwrap();
        assert_eq!(plan.edited, TaskUpdate::new("a".into(), at(9, 45), at(10, 0)));
    }

    #[test]
    fn test_cascade_start_past_end_is_clamped() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let plan = session.cascade_start_edge(&abc(), &"a".into(), at(11, 0)).unwrap();
        assert_eq!(plan.edited, TaskUpdate::new("a".into(), at(9, 45), at(10, 0)));
        assert!(plan.ripple.is_empty());
    }

    #[test]
    fn test_move_task_later_cascades() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let tasks = abc();
        let plan = session.move_task(&tasks, &"a".into(), at(9, 45)).unwrap();
        assert_eq!(plan.edited, TaskUpdate::new("a".into(), at(9, 45), at(10, 45)));
        assert_eq!(
            plan.ripple,
            vec![
                TaskUpdate::new("b".into(), at(10, 45), at(11, 45)),
                TaskUpdate::new("c".into(), at(11, 45), at(12, 45)),
            ]
        );
    }

    #[test]
    fn test_move_off_the_day_is_rejected() {
        let session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let err = session.move_task(&abc(), &"c".into(), at(23, 30)).unwrap_err();
        assert!(matches!(err, EngineError::Chain(ChainError::CrossesDayBoundary { .. })));
    }

    #[test]
    fn test_place_uses_session_cache() {
        let mut session = EditSession::new(test_day(), EngineConfig::default()).unwrap();
        let tasks = abc();
        let first = session.place(&tasks, &"new".into(), at(10, 0), Duration::minutes(30)).unwrap();
        let second = session.place(&tasks, &"new".into(), at(10, 0), Duration::minutes(30)).unwrap();
        assert_eq!(first, second);
        // 08:30 is 90 min away, 12:00 is 120.
        assert_eq!(first, Slot::new(at(8, 30), at(9, 0)));
        assert_eq!(session.cache_stats().hits, 1);
    }
}
