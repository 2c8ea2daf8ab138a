//! Bounds validation: day window, overlap and minimum-duration predicates.
//!
//! Everything here is a pure function over a snapshot. Callers on the hot
//! path use [`crate::index::IntervalIndex`] instead of the O(n) scans.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::task::{Task, TaskId};

/// `[start, end]` window every task of the day must fit in.
///
/// `end` is one minute before the next midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DayBounds {
    pub fn contains(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start <= start && end <= self.end && start < end
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// Canonical day window for `date`.
pub fn day_bounds_for(date: NaiveDate) -> DayBounds {
    let start = date.and_time(chrono::NaiveTime::MIN);
    DayBounds {
        start,
        end: start + Duration::days(1) - Duration::minutes(1),
    }
}

/// Strict interval overlap; touching edges are not an overlap.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn meets_min_duration(start: NaiveDateTime, end: NaiveDateTime, min: Duration) -> bool {
    end - start >= min
}

/// Where a dragged start edge may land: inside the day, and at least `min`
/// before the task's end.
pub fn clamp_start_edge(task: &Task, new_start: NaiveDateTime, bounds: &DayBounds, min: Duration) -> NaiveDateTime {
    let latest = (task.end - min).max(bounds.start);
    new_start.max(bounds.start).min(latest)
}

/// Where a dragged end edge may land: inside the day, and at least `min`
/// after the task's start.
pub fn clamp_end_edge(task: &Task, new_end: NaiveDateTime, bounds: &DayBounds, min: Duration) -> NaiveDateTime {
    let earliest = (task.start + min).min(bounds.end);
    new_end.min(bounds.end).max(earliest)
}

/// Is `[start, end)` inside `bounds` and clear of every task except `excluding`?
pub fn is_slot_free(
    start: NaiveDateTime,
    end: NaiveDateTime,
    excluding: Option<&TaskId>,
    tasks: &[Task],
    bounds: &DayBounds,
) -> bool {
    if !bounds.contains(start, end) {
        return false;
    }
    !tasks
        .iter()
        .filter(|t| Some(&t.id) != excluding)
        .any(|t| t.overlaps(start, end))
}

/// A broken day invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Overlap(TaskId, TaskId),
    TooShort(TaskId),
    OutOfBounds(TaskId),
}

/// Report every invariant violation in `tasks`. Empty means the day is valid.
pub fn validate_day(tasks: &[Task], bounds: &DayBounds, config: &EngineConfig) -> Vec<Violation> {
    let mut out = Vec::new();

    for t in tasks {
        if !bounds.contains(t.start, t.end) {
            out.push(Violation::OutOfBounds(t.id.clone()));
        }
        if !meets_min_duration(t.start, t.end, config.min_duration()) {
            out.push(Violation::TooShort(t.id.clone()));
        }
    }

    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            if b.start >= a.end {
                break;
            }
            if a.overlaps(b.start, b.end) {
                out.push(Violation::Overlap(a.id.clone(), b.id.clone()));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{at, test_day};

    fn day() -> Vec<Task> {
        vec![
            Task::new("a", "a", at(9, 0), at(10, 0)),
            Task::new("b", "b", at(11, 0), at(12, 0)),
        ]
    }

    #[test]
    fn test_day_bounds_end_one_minute_before_midnight() {
        let b = day_bounds_for(test_day());
        assert_eq!(b.start, at(0, 0));
        assert_eq!(b.end, at(23, 59));
    }

    #[test]
    fn test_slot_free_in_gap() {
        let b = day_bounds_for(test_day());
        assert!(is_slot_free(at(10, 0), at(11, 0), None, &day(), &b));
        assert!(!is_slot_free(at(9, 30), at(10, 30), None, &day(), &b));
    }

    #[test]
    fn test_slot_free_ignores_excluded_task() {
        let b = day_bounds_for(test_day());
        let id = TaskId::new("a");
        assert!(is_slot_free(at(9, 30), at(10, 30), Some(&id), &day(), &b));
    }

    #[test]
    fn test_slot_outside_day_is_not_free() {
        let b = day_bounds_for(test_day());
        assert!(!is_slot_free(at(23, 30), at(23, 59) + Duration::minutes(1), None, &[], &b));
        assert!(is_slot_free(at(23, 30), at(23, 59), None, &[], &b));
    }

    #[test]
    fn test_validate_day_reports_each_violation() {
        let b = day_bounds_for(test_day());
        let tasks = vec![
            Task::new("a", "a", at(9, 0), at(10, 0)),
            Task::new("b", "b", at(9, 30), at(9, 40)),
            Task::new("c", "c", at(23, 0), at(23, 59) + Duration::minutes(30)),
        ];
        let v = validate_day(&tasks, &b, &EngineConfig::default());
        assert!(v.contains(&Violation::Overlap("a".into(), "b".into())));
        assert!(v.contains(&Violation::TooShort("b".into())));
        assert!(v.contains(&Violation::OutOfBounds("c".into())));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_edge_clamps_keep_min_duration() {
        let b = day_bounds_for(test_day());
        let t = Task::new("a", "a", at(9, 0), at(10, 0));
        let min = Duration::minutes(15);

        assert_eq!(clamp_end_edge(&t, at(9, 5), &b, min), at(9, 15));
        assert_eq!(clamp_end_edge(&t, at(8, 0), &b, min), at(9, 15));
        assert_eq!(clamp_end_edge(&t, at(23, 59) + Duration::hours(1), &b, min), at(23, 59));
        assert_eq!(clamp_end_edge(&t, at(11, 0), &b, min), at(11, 0));

        assert_eq!(clamp_start_edge(&t, at(9, 55), &b, min), at(9, 45));
        assert_eq!(clamp_start_edge(&t, at(11, 0), &b, min), at(9, 45));
        assert_eq!(clamp_start_edge(&t, at(0, 0) - Duration::hours(1), &b, min), at(0, 0));
        assert_eq!(clamp_start_edge(&t, at(8, 0), &b, min), at(8, 0));
    }

    #[test]
    fn test_queries_are_repeatable() {
        let b = day_bounds_for(test_day());
        let tasks = day();
        let first = is_slot_free(at(10, 15), at(10, 45), None, &tasks, &b);
        for _ in 0..3 {
            assert_eq!(is_slot_free(at(10, 15), at(10, 45), None, &tasks, &b), first);
        }
    }
}
