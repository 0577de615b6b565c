use crate::thread::ThreadId;
use crate::{event::Event, indexed_map::IndexedMap};
use std::cmp;

use serde::{Deserialize, Serialize};

/// A per-thread summary of an event's causal history.
///
/// Component `t` is the index of the latest event of thread `t` that is in
/// the history; a missing component means no event of that thread is. The
/// same representation doubles as a *view*: a per-thread frontier of
/// last-kept indices used to delimit cuts and revisit windows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct VectorClock {
    clock: IndexedMap<u32>,
}

impl VectorClock {
    pub(crate) fn new() -> Self {
        Self {
            clock: IndexedMap::new(),
        }
    }

    pub(crate) fn get(&self, i: ThreadId) -> Option<u32> {
        self.clock.get(usize::from(i)).copied()
    }

    // Populate tid and set index to 0
    pub(crate) fn set_tid(&mut self, tid: ThreadId) {
        self.clock.set(usize::from(tid), 0);
    }

    // returns true iff self represents a history that contains the event e
    pub(crate) fn contains(&self, e: Event) -> bool {
        self.get(e.thread).map_or(false, |i| e.index <= i)
    }

    // Update, populating the thread with the index, if it's missing.
    // This is the "increment" of the algorithm: an event enters its own
    // thread's component exactly once, when it is appended.
    pub(crate) fn update_or_set(&mut self, e: Event) {
        self.advance(usize::from(e.thread), e.index);
    }

    // Pointwise max with another clock
    pub(crate) fn update(&mut self, other: &Self) {
        for (tid, &other_val) in other.clock.enumerate() {
            self.advance(tid, other_val);
        }
    }

    /// Pointwise comparison: every component of `self` is present in and
    /// bounded by `other`.
    pub(crate) fn leq(&self, other: &Self) -> bool {
        self.clock
            .enumerate()
            .all(|(tid, &val)| other.clock.get(tid).is_some_and(|&o| val <= o))
    }

    // Advance tid to be at least ind, populating the tid entry if missing
    fn advance(&mut self, tid: usize, ind: u32) {
        let new_val: u32 = cmp::max(*self.clock.get(tid).unwrap_or(&0), ind);
        self.clock.set(tid, new_val);
    }
}
