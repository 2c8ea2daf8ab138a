//! PlacementCache: bounded memo for placement decisions.
//!
//! Successive drag frames tend to ask the same question against the same
//! day, so results are keyed by the full decision input:
//! `(task_id, preferred_start, duration, state_hash)`.
//!
//! When full, the oldest half of the entries is dropped.

use chrono::{Duration, NaiveDateTime};
use log::debug;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use crate::bounds::DayBounds;
use crate::placement::Slot;
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlacementKey {
    task_id: TaskId,
    preferred_start: NaiveDateTime,
    duration_secs: i64,
    state_hash: u64,
}

impl PlacementKey {
    pub fn new(
        task_id: &TaskId,
        preferred_start: NaiveDateTime,
        duration: Duration,
        state_hash: u64,
    ) -> Self {
        Self {
            task_id: task_id.clone(),
            preferred_start,
            duration_secs: duration.num_seconds(),
            state_hash,
        }
    }
}

/// Hash of everything a placement for `task_id` depends on: the day window
/// and every other task's bounds, independent of input order.
pub fn state_hash(tasks: &[Task], task_id: &TaskId, bounds: &DayBounds) -> u64 {
    let mut others: Vec<(&TaskId, NaiveDateTime, NaiveDateTime)> = tasks
        .iter()
        .filter(|t| &t.id != task_id)
        .map(|t| (&t.id, t.start, t.end))
        .collect();
    others.sort();

    let mut h = DefaultHasher::new();
    bounds.hash(&mut h);
    others.hash(&mut h);
    h.finish()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone)]
pub struct PlacementCache {
    max_size: usize,
    entries: HashMap<PlacementKey, Slot>,
    // insertion order, oldest first
    order: VecDeque<PlacementKey>,
    stats: CacheStats,
}

impl PlacementCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn get(&mut self, key: &PlacementKey) -> Option<Slot> {
        match self.entries.get(key) {
            Some(slot) => {
                self.stats.hits += 1;
                Some(*slot)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: PlacementKey, slot: Slot) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, slot);
            return;
        }
        if self.entries.len() >= self.max_size {
            self.evict_oldest_half();
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, slot);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict_oldest_half(&mut self) {
        let n = (self.order.len() / 2).max(1);
        for key in self.order.drain(..n) {
            self.entries.remove(&key);
        }
        self.stats.evictions += n as u64;
        debug!("placement cache full; evicted {n} entries");
    }
}
