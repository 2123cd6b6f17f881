/// Bounded undo history.
///
/// A ring of `HistorySnapshot`s: `record` appends at the tail and evicts
/// from the head once `capacity` is exceeded, `undo` pops the tail.
/// Snapshots are owned exclusively by the history; `undo` hands ownership
/// back to the caller, who restores it into the live state in one piece.

use std::collections::VecDeque;

use crate::domain::state::HistorySnapshot;

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Clone, Debug)]
pub struct HistoryManager {
    stack: VecDeque<HistorySnapshot>,
    capacity: usize,
}

impl HistoryManager {
    /// Capacity is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistoryManager { stack: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn record(&mut self, snap: HistorySnapshot) {
        if self.stack.len() == self.capacity {
            self.stack.pop_front();
        }
        self.stack.push_back(snap);
    }

    /// Most recent snapshot, or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        self.stack.pop_back()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        HistoryManager::new(DEFAULT_CAPACITY)
    }
}
