//! An event position in an execution graph
use crate::thread::{main_thread_id, ThreadId};
use serde::{Deserialize, Serialize};

/// The position of a single event in an execution graph: a thread and an
/// index into that thread's program order.
///
/// Positions are graph-local handles. All cross-references between events
/// (reads-from, coherence predecessors) are stored as positions and resolved
/// against the owning graph, so cloning a graph never produces edges that
/// dangle into the original.
#[derive(PartialEq, Copy, Clone, Debug, Hash, Eq, Serialize, Deserialize)]
pub struct Event {
    pub(crate) thread: ThreadId,
    pub(crate) index: u32,
}

impl Event {
    pub fn new(t: ThreadId, i: u32) -> Self {
        Self {
            thread: t,
            index: i,
        }
    }

    /// Position of the initialization event, fixed at `(t0, 0)`.
    pub(crate) fn new_init() -> Self {
        Self::new(main_thread_id(), 0)
    }

    pub(crate) fn prev(&self) -> Self {
        Self {
            thread: self.thread,
            index: self.index - 1,
        }
    }

    /// The thread this event belongs to.
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// The event's position within its thread's program order.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.thread, self.index)
    }
}
