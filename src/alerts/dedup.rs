use std::collections::{HashSet, VecDeque};

use crate::models::EventIdentity;

pub const DEFAULT_CAPACITY: usize = 1_000;

/// Bounded window of already-alerted event identities.
///
/// Entries are kept in insertion order. Once the window grows past
/// `capacity`, the oldest entries are dropped in one batch until only
/// `capacity / 2` remain.
#[derive(Debug, Clone)]
pub struct DedupStore {
    capacity: usize,
    order: VecDeque<EventIdentity>,
    seen: HashSet<EventIdentity>,
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DedupStore {
    /// `capacity` is clamped to at least 2 so half-eviction always keeps something.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            seen: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn contains(&self, id: &EventIdentity) -> bool {
        self.seen.contains(id)
    }

    /// Remember `id`. Recording an identity twice keeps its original position.
    pub fn record(&mut self, id: EventIdentity) {
        if self.seen.insert(id.clone()) {
            self.order.push_back(id);
        }
    }

    /// Returns how many identities were evicted.
    pub fn evict_if_over_capacity(&mut self) -> usize {
        if self.order.len() <= self.capacity {
            return 0;
        }

        let keep = self.capacity / 2;
        let evict = self.order.len() - keep;
        for id in self.order.drain(..evict) {
            self.seen.remove(&id);
        }

        tracing::debug!(evicted = evict, retained = keep, "Dedup window trimmed");
        evict
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
