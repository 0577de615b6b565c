//! Revgraph is an execution-graph exploration engine for stateless model
//! checking. It maintains a frontier of candidate execution graphs and, as a
//! program's memory accesses stream in thread by thread, enumerates every
//! consistent placement of each access: a read may observe any
//! causally-legal same-location write, a write may take any legal coherence
//! position, and a new write may retroactively become the source of an
//! already-committed read (a *backward revisit*, which cuts the read's
//! causal future and replays the independent remainder).
//!
//! The engine is oblivious to thread scheduling: it tracks causality with
//! vector clocks over event positions, so the caller may feed accesses in
//! any order that respects each thread's program order.
//!
//! ```
//! use revgraph::{construct_thread_id, Config, Strategy};
//!
//! let config = Config::builder().with_n_threads(2).build();
//! let mut strategy = Strategy::new(config);
//! let t0 = construct_thread_id(0);
//! let t1 = construct_thread_id(1);
//!
//! strategy.add_write_event("x", t0)?;
//! strategy.add_read_event("x", t1)?;
//!
//! // the read observes either the initial value or the write
//! assert_eq!(strategy.graph_count(), 2);
//! # Ok::<(), revgraph::Error>(())
//! ```

mod cons;
mod event;
mod event_label;
mod exec_graph;
mod indexed_map;
mod loc;
mod revisit;
mod strategy;
mod thread;
mod vector_clock;

pub use crate::event::Event;
pub use crate::exec_graph::ExecutionGraph;
pub use crate::loc::{Identifier, Loc};
pub use crate::strategy::Strategy;
pub use crate::thread::{construct_thread_id, main_thread_id, ThreadId};

use serde::{Deserialize, Serialize};

/// Exploration statistics.
#[derive(Default, Clone, Debug)]
pub struct Stats {
    /// Number of program events fed to the driver
    pub events: usize,
    /// Current size of the graph frontier
    pub graphs: usize,
    /// Number of branches spawned by forward revisits
    pub forward_revisits: usize,
    /// Number of branches spawned by backward revisits
    pub backward_revisits: usize,
}

/// Ways the exploration can fail.
///
/// `NoConsistentWrite` and `PositionGap` signal violations of invariants the
/// engine maintains itself; seeing one from the public API means a bug, and
/// the offending [`Strategy`] should be discarded.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The candidate set for an event came back empty. The initialization
    /// event is a legal source for every location, so this cannot happen on
    /// a well-formed graph.
    #[error("no consistent write for event {pos} at location {loc}")]
    NoConsistentWrite { pos: Event, loc: String },

    /// An access was reported for a thread outside the configured range.
    #[error("unknown thread {tid}: graphs are configured with {n_threads} threads")]
    UnknownThread { tid: ThreadId, n_threads: usize },

    /// The frontier grew past the configured bound.
    #[error("exploration frontier exceeds the configured limit of {limit} graphs")]
    TooManyGraphs { limit: usize },

    /// An insertion would leave a hole in its thread's program order.
    #[error("event {pos} would leave a program-order gap: expected index {expected}")]
    PositionGap { pos: Event, expected: u32 },
}

/// Exploration configuration options.
///
/// Use the [`ConfigBuilder`] class to construct a `Config` struct.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub(crate) n_threads: usize,
    pub(crate) max_graphs: Option<usize>,
    pub(crate) thread_threshold: u32,
    pub(crate) verbose: usize,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Builds a [`Config`] struct.
pub struct ConfigBuilder(Config);

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder(Config {
            n_threads: 1,
            max_graphs: None,
            thread_threshold: 1000,
            verbose: 0,
        })
    }

    /// Checks whether the current config is valid and
    /// returns it if it is. Raises an error otherwise
    fn check_valid(self) -> Self {
        if self.0.n_threads == 0 {
            panic!("Execution graphs need at least one thread");
        }
        self
    }

    /// Specifies how many threads the explored program has. Thread 0 hosts
    /// the initialization event.
    pub fn with_n_threads(mut self, n: usize) -> Self {
        self.0.n_threads = n;
        self
    }

    /// Bounds the size of the graph frontier; the driver reports
    /// [`Error::TooManyGraphs`] when an event pushes it past the bound.
    /// Unbounded by default.
    pub fn with_max_graphs(mut self, n: usize) -> Self {
        self.0.max_graphs = Some(n);
        self
    }

    /// Specifies the per-thread event count after which the driver warns
    /// about a possibly runaway thread
    pub fn with_thread_threshold(mut self, s: u32) -> Self {
        self.0.thread_threshold = s;
        self
    }

    /// Sets the verbosity level. At level 3 and above the driver dumps
    /// every frontier graph after each event.
    pub fn with_verbose(mut self, v: usize) -> Self {
        self.0.verbose = v;
        self
    }

    pub fn build(self) -> Config {
        self.check_valid().0
    }
}
