//! Task model: a timed block on a single local day.
//!
//! Tasks are owned by the caller. The engine only ever reads snapshots and
//! hands back [`TaskUpdate`] instructions.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bounds::intervals_overlap;

/// Opaque task identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Presentation payload. Carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,

    /// Local wall-clock start (inclusive).
    pub start: NaiveDateTime,
    /// Local wall-clock end (exclusive).
    pub end: NaiveDateTime,

    #[serde(default)]
    pub appearance: Appearance,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
            appearance: Appearance::default(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.appearance.color = Some(color.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.appearance.icon = Some(icon.into());
        self
    }

    /// Same task, moved to new bounds.
    pub fn with_bounds(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        intervals_overlap(self.start, self.end, start, end)
    }
}

/// Update instruction: move `task_id` to `[new_start, new_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub new_start: NaiveDateTime,
    pub new_end: NaiveDateTime,
}

impl TaskUpdate {
    pub fn new(task_id: TaskId, new_start: NaiveDateTime, new_end: NaiveDateTime) -> Self {
        Self {
            task_id,
            new_start,
            new_end,
        }
    }
}

/// Apply updates in order. Updates naming unknown ids are skipped; returns
/// how many were applied.
pub fn apply_updates(tasks: &mut [Task], updates: &[TaskUpdate]) -> usize {
    let mut applied = 0;
    for u in updates {
        if let Some(t) = tasks.iter_mut().find(|t| t.id == u.task_id) {
            t.start = u.new_start;
            t.end = u.new_end;
            applied += 1;
        }
    }
    applied
}
