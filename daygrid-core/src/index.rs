//! IntervalIndex: hour-bucketed overlap lookup.
//!
//! Built fresh from a snapshot for each engine call and dropped afterwards.
//!
//! Buckets:
//! - one per wall-clock hour, 0..=23
//! - a task sits in every bucket it touches; a task crossing midnight walks
//!   `start..=23` then `0..=end`
//!
//! Queries are two-phase: buckets give a coarse candidate set, exact interval
//! comparison decides.

use chrono::{Duration, NaiveDateTime, Timelike};
use std::collections::HashSet;

use crate::bounds::intervals_overlap;
use crate::task::{Task, TaskId};

const HOURS: usize = 24;

/// Hours touched by `[start, end)`, in walk order.
fn hours_touched(start: NaiveDateTime, end: NaiveDateTime) -> Vec<usize> {
    if end - start >= Duration::days(1) {
        return (0..HOURS).collect();
    }

    // Last instant actually covered; an end on the hour does not touch that hour.
    let last = if end > start {
        end - Duration::nanoseconds(1)
    } else {
        start
    };
    let first_hour = start.hour() as usize;
    let last_hour = last.hour() as usize;

    if start.date() == last.date() {
        (first_hour..=last_hour).collect()
    } else {
        (first_hour..HOURS).chain(0..=last_hour).collect()
    }
}

#[derive(Debug, Clone)]
pub struct IntervalIndex<'a> {
    buckets: Vec<Vec<&'a Task>>,
}

impl<'a> IntervalIndex<'a> {
    /// Bucket every task except `excluding`.
    pub fn build(tasks: &'a [Task], excluding: Option<&TaskId>) -> Self {
        let mut buckets: Vec<Vec<&'a Task>> = vec![Vec::new(); HOURS];
        for t in tasks.iter().filter(|t| Some(&t.id) != excluding) {
            for h in hours_touched(t.start, t.end) {
                buckets[h].push(t);
            }
        }
        Self { buckets }
    }

    pub fn bucket(&self, hour: usize) -> &[&'a Task] {
        self.buckets.get(hour).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks strictly overlapping `[start, end)` that are not in `processed`,
    /// ordered by `(start, id)`.
    pub fn query_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        processed: &HashSet<TaskId>,
    ) -> Vec<&'a Task> {
        let mut seen: HashSet<&TaskId> = HashSet::new();
        let mut out: Vec<&'a Task> = Vec::new();

        for h in hours_touched(start, end) {
            for &t in &self.buckets[h] {
                if processed.contains(&t.id) || !seen.insert(&t.id) {
                    continue;
                }
                if intervals_overlap(start, end, t.start, t.end) {
                    out.push(t);
                }
            }
        }

        out.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        out
    }
}
