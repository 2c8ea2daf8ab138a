//! Placement search: nearest free gap for a task that has to move.
//!
//! Order of preference:
//! 1. the preferred slot itself, if free
//! 2. the fitting gap whose clamped start is closest to the preference,
//!    within `max_search_radius` (ties go to the earlier gap)
//! 3. first fit over every gap of the day
//!
//! A day with no gap long enough is a [`PlacementError`].

use chrono::{Duration, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::bounds::{DayBounds, is_slot_free};
use crate::cache::{PlacementCache, PlacementKey, state_hash};
use crate::config::EngineConfig;
use crate::error::PlacementError;
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Free stretches of the day, ascending, ignoring `excluding`.
pub fn free_gaps(tasks: &[Task], excluding: Option<&TaskId>, bounds: &DayBounds) -> Vec<Slot> {
    let mut sorted: Vec<&Task> = tasks
        .iter()
        .filter(|t| Some(&t.id) != excluding)
        .collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut gaps = Vec::new();
    let mut cursor = bounds.start;
    for t in sorted {
        let gap_end = t.start.min(bounds.end);
        if gap_end > cursor {
            gaps.push(Slot::new(cursor, gap_end));
        }
        cursor = cursor.max(t.end);
        if cursor >= bounds.end {
            return gaps;
        }
    }
    if bounds.end > cursor {
        gaps.push(Slot::new(cursor, bounds.end));
    }
    gaps
}

/// Every `step`-aligned start (relative to the start of day) where a task of
/// `duration` fits without overlap. Empty for a non-positive `duration`.
pub fn free_slots(
    tasks: &[Task],
    bounds: &DayBounds,
    duration: Duration,
    step: Duration,
) -> Vec<Slot> {
    let mut out = Vec::new();
    if duration <= Duration::zero() {
        return out;
    }
    let step_secs = step.num_seconds().max(1);
    let step = Duration::seconds(step_secs);
    for gap in free_gaps(tasks, None, bounds) {
        let offset = (gap.start - bounds.start).num_seconds();
        let aligned = (offset + step_secs - 1).div_euclid(step_secs) * step_secs;
        let mut start = bounds.start + Duration::seconds(aligned);
        while start + duration <= gap.end {
            out.push(Slot::new(start, start + duration));
            start += step;
        }
    }
    out
}

/// Uncached placement search.
pub fn compute_placement(
    tasks: &[Task],
    task_id: &TaskId,
    preferred_start: NaiveDateTime,
    duration: Duration,
    bounds: &DayBounds,
    config: &EngineConfig,
) -> Result<Slot, PlacementError> {
    if duration <= Duration::zero() {
        return Err(PlacementError::InvalidDuration {
            task_id: task_id.clone(),
            duration_minutes: duration.num_minutes(),
        });
    }

    let preferred_end = preferred_start + duration;
    if is_slot_free(preferred_start, preferred_end, Some(task_id), tasks, bounds) {
        return Ok(Slot::new(preferred_start, preferred_end));
    }

    let gaps = free_gaps(tasks, Some(task_id), bounds);
    let radius = config.max_search_radius();

    let mut best: Option<(Duration, Slot)> = None;
    for gap in gaps.iter().filter(|g| g.duration() >= duration) {
        let latest = gap.end - duration;
        let start = preferred_start.clamp(gap.start, latest);
        let distance = if start >= preferred_start {
            start - preferred_start
        } else {
            preferred_start - start
        };
        if distance > radius {
            continue;
        }
        if best.is_none_or(|(d, _)| distance < d) {
            best = Some((distance, Slot::new(start, start + duration)));
        }
    }
    if let Some((_, slot)) = best {
        return Ok(slot);
    }

    debug!("no gap near {preferred_start} for {task_id}; falling back to first fit");
    gaps.iter()
        .find(|g| g.duration() >= duration)
        .map(|g| Slot::new(g.start, g.start + duration))
        .ok_or_else(|| PlacementError::NoFreeSlot {
            task_id: task_id.clone(),
            duration_minutes: duration.num_minutes(),
        })
}

/// Placement search with a session-scoped memo.
#[derive(Debug, Clone)]
pub struct PlacementOptimizer {
    config: EngineConfig,
    cache: PlacementCache,
}

impl PlacementOptimizer {
    pub fn new(config: EngineConfig) -> Self {
        let cache = PlacementCache::new(config.cache_max_size);
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &PlacementCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Find a free `[start, start + duration)` for `task_id`, as close to
    /// `preferred_start` as the day allows. `tasks` may include the task
    /// itself; it is ignored.
    pub fn find_placement(
        &mut self,
        tasks: &[Task],
        task_id: &TaskId,
        preferred_start: NaiveDateTime,
        duration: Duration,
        bounds: &DayBounds,
    ) -> Result<Slot, PlacementError> {
        let key = PlacementKey::new(
            task_id,
            preferred_start,
            duration,
            state_hash(tasks, task_id, bounds),
        );
        if let Some(slot) = self.cache.get(&key) {
            return Ok(slot);
        }

        let slot = compute_placement(tasks, task_id, preferred_start, duration, bounds, &self.config)?;
        self.cache.insert(key, slot);
        Ok(slot)
    }
}

impl Default for PlacementOptimizer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::day_bounds_for;
    use crate::time::{at, test_day};

    fn two_blocks() -> Vec<Task> {
        vec![
            Task::new("a", "a", at(9, 0), at(10, 0)),
            Task::new("b", "b", at(11, 0), at(12, 0)),
        ]
    }

    #[test]
    fn test_preferred_slot_in_gap_is_kept() {
        let b = day_bounds_for(test_day());
        let mut opt = PlacementOptimizer::default();
        let slot = opt
            .find_placement(&two_blocks(), &"new".into(), at(10, 15), Duration::minutes(30), &b)
            .unwrap();
        assert_eq!(slot, Slot::new(at(10, 15), at(10, 45)));
    }

    #[test]
    fn test_busy_preference_clamps_into_nearest_gap() {
        let b = day_bounds_for(test_day());
        let mut opt = PlacementOptimizer::default();
        // 09:50 is busy; the 10:00-11:00 gap is nearest.
        let slot = opt
            .find_placement(&two_blocks(), &"new".into(), at(9, 50), Duration::minutes(30), &b)
            .unwrap();
        assert_eq!(slot, Slot::new(at(10, 0), at(10, 30)));

        // Too long for that gap; 12:00 is closer than 07:30.
        let slot = opt
            .find_placement(&two_blocks(), &"new".into(), at(10, 30), Duration::minutes(90), &b)
            .unwrap();
        assert_eq!(slot, Slot::new(at(12, 0), at(13, 30)));
    }

    #[test]
    fn test_equal_distance_prefers_earlier_gap() {
        let b = day_bounds_for(test_day());
        let tasks = vec![
            Task::new("a", "a", at(8, 0), at(10, 0)),
            Task::new("b", "b", at(10, 0), at(12, 0)),
        ];
        // Preferring 09:00 for 2h: 06:00 and 12:00 are both 3h away.
        let slot =
            compute_placement(&tasks, &"x".into(), at(9, 0), Duration::hours(2), &b, &EngineConfig::default())
                .unwrap();
        assert_eq!(slot, Slot::new(at(6, 0), at(8, 0)));
    }

    #[test]
    fn test_outside_radius_falls_back_to_first_fit() {
        let b = day_bounds_for(test_day());
        let tasks = vec![Task::new("a", "a", at(1, 0), at(23, 0))];
        let cfg = EngineConfig {
            max_search_radius_minutes: 30,
            ..EngineConfig::default()
        };
        let slot = compute_placement(&tasks, &"x".into(), at(12, 0), Duration::minutes(30), &b, &cfg).unwrap();
        assert_eq!(slot, Slot::new(at(0, 0), at(0, 30)));
    }

    #[test]
    fn test_full_day_is_an_error() {
        let b = day_bounds_for(test_day());
        let tasks = vec![Task::new("a", "a", at(0, 0), at(23, 59))];
        let err = compute_placement(&tasks, &"x".into(), at(12, 0), Duration::minutes(15), &b, &EngineConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            PlacementError::NoFreeSlot {
                task_id: "x".into(),
                duration_minutes: 15
            }
        );
    }

    #[test]
    fn test_repeat_call_is_served_from_cache() {
        let b = day_bounds_for(test_day());
        let mut opt = PlacementOptimizer::default();
        let tasks = two_blocks();
        let first = opt.find_placement(&tasks, &"n".into(), at(9, 50), Duration::minutes(30), &b);
        let second = opt.find_placement(&tasks, &"n".into(), at(9, 50), Duration::minutes(30), &b);
        assert_eq!(first, second);
        assert_eq!(opt.cache().stats().hits, 1);
        assert_eq!(opt.cache().stats().misses, 1);
    }

    #[test]
    fn test_changed_day_misses_cache() {
        let b = day_bounds_for(test_day());
        let mut opt = PlacementOptimizer::default();
        let mut tasks = two_blocks();
        opt.find_placement(&tasks, &"n".into(), at(9, 50), Duration::minutes(30), &b).unwrap();
        tasks[0].end = at(10, 30);
        let slot = opt.find_placement(&tasks, &"n".into(), at(9, 50), Duration::minutes(30), &b).unwrap();
        assert_eq!(slot, Slot::new(at(10, 30), at(11, 0)));
        assert_eq!(opt.cache().stats().hits, 0);
    }

    #[test]
    fn test_free_gaps_and_aligned_slots() {
        let b = day_bounds_for(test_day());
        let tasks = vec![
            Task::new("a", "a", at(0, 0), at(10, 10)),
            Task::new("b", "b", at(11, 0), at(23, 59)),
        ];
        assert_eq!(free_gaps(&tasks, None, &b), vec![Slot::new(at(10, 10), at(11, 0))]);

        let slots = free_slots(&tasks, &b, Duration::minutes(15), Duration::minutes(15));
        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![at(10, 15), at(10, 30), at(10, 45)]);
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let b = day_bounds_for(test_day());
        let mut opt = PlacementOptimizer::default();
        let err = opt
            .find_placement(&two_blocks(), &"n".into(), at(9, 30), Duration::minutes(-30), &b)
            .unwrap_err();
        assert_eq!(
            err,
            PlacementError::InvalidDuration {
                task_id: "n".into(),
                duration_minutes: -30
            }
        );
        assert!(matches!(
            opt.find_placement(&two_blocks(), &"n".into(), at(9, 0), Duration::zero(), &b),
            Err(PlacementError::InvalidDuration { .. })
        ));
        assert!(opt.cache().is_empty());
        assert!(free_slots(&two_blocks(), &b, Duration::zero(), Duration::minutes(15)).is_empty());
    }

    #[test]
    fn test_zero_step_still_advances() {
        let b = day_bounds_for(test_day());
        let tasks = vec![
            Task::new("a", "a", at(0, 0), at(10, 0)),
            Task::new("b", "b", at(10, 0) + Duration::seconds(3), at(23, 59)),
        ];
        let slots = free_slots(&tasks, &b, Duration::seconds(1), Duration::zero());
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[2], Slot::new(at(10, 0) + Duration::seconds(2), at(10, 0) + Duration::seconds(3)));
    }
}
