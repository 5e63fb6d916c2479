//! Tracked-identifier cache.

use std::collections::{HashSet, VecDeque};

/// Remembers which tweet identifiers have already been recorded.
///
/// Bounded: once `capacity` identifiers are tracked, inserting a new one
/// evicts the oldest. An evicted tweet could in principle be recorded a
/// second time, but engagement-threshold retweets recur within minutes,
/// not days, so a generous capacity makes that window irrelevant while
/// keeping memory flat for a process that runs for months.
#[derive(Debug)]
pub struct DedupCache {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "dedup capacity must be positive");
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Track an identifier. Returns `false` if it was already tracked.
    pub fn insert(&mut self, id: String) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
