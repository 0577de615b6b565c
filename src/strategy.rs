//! The exploration driver: a frontier of graphs advanced one event at a time.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::cons::Consistency;
use crate::exec_graph::ExecutionGraph;
use crate::loc::{Identifier, Loc};
use crate::thread::ThreadId;
use crate::{Config, Error, Stats};

/// Drives the exploration.
///
/// The strategy owns the frontier of execution graphs. Reporting an access
/// applies it to every graph in the frontier; each graph commits to one
/// placement and the branches it spawns (forward and backward revisits) are
/// queued behind the existing graphs, so the frontier is explored
/// breadth-first in spawn order.
pub struct Strategy {
    graphs: VecDeque<ExecutionGraph>,
    checker: Consistency,
    config: Config,
    stats: Stats,
}

impl Strategy {
    pub fn new(config: Config) -> Strategy {
        let mut graphs = VecDeque::new();
        graphs.push_back(ExecutionGraph::new(config.n_threads));
        info!("starting exploration with {} threads", config.n_threads);
        let stats = Stats {
            graphs: 1,
            ..Stats::default()
        };
        Strategy {
            graphs,
            checker: Consistency {},
            config,
            stats,
        }
    }

    /// Report that `tid` read the location `loc`.
    ///
    /// On error the frontier may be partially advanced; callers should
    /// discard the strategy.
    pub fn add_read_event(&mut self, loc: impl Identifier, tid: ThreadId) -> Result<(), Error> {
        let loc = Loc::new(loc);
        self.add_access(&loc, tid, AccessKind::Read)
    }

    /// Report that `tid` wrote to the location `loc`.
    ///
    /// On error the frontier may be partially advanced; callers should
    /// discard the strategy.
    pub fn add_write_event(&mut self, loc: impl Identifier, tid: ThreadId) -> Result<(), Error> {
        let loc = Loc::new(loc);
        self.add_access(&loc, tid, AccessKind::Write)
    }

    fn add_access(&mut self, loc: &Loc, tid: ThreadId, kind: AccessKind) -> Result<(), Error> {
        if usize::from(tid) >= self.config.n_threads {
            return Err(Error::UnknownThread {
                tid,
                n_threads: self.config.n_threads,
            });
        }

        let Strategy {
            graphs,
            checker,
            config,
            stats,
        } = self;
        stats.events += 1;

        let mut spawned: VecDeque<ExecutionGraph> = VecDeque::new();
        for g in graphs.iter_mut() {
            let branches = match kind {
                AccessKind::Read => g.add_read_event(loc, tid, checker)?,
                AccessKind::Write => g.add_write_event(loc, tid, checker)?,
            };
            if g.thread_size(tid) as u32 == config.thread_threshold {
                warn!(
                    "thread {} reached {} events; is it running away?",
                    tid, config.thread_threshold
                );
            }
            for (rev, ng) in branches {
                if rev.is_backward() {
                    stats.backward_revisits += 1;
                    debug!("backward revisit branch: {} observes {}", rev.pos(), rev.rev());
                } else {
                    stats.forward_revisits += 1;
                    debug!("forward revisit branch: {} placed at {}", rev.pos(), rev.rev());
                }
                spawned.push_back(ng);
            }
        }

        graphs.append(&mut spawned);
        stats.graphs = graphs.len();
        debug!(
            "{:?} {} by {}: frontier now holds {} graphs",
            kind,
            loc,
            tid,
            graphs.len()
        );
        if config.verbose >= 3 {
            for g in graphs.iter() {
                println!("{}", g);
            }
        }

        if let Some(limit) = config.max_graphs {
            if graphs.len() > limit {
                return Err(Error::TooManyGraphs { limit });
            }
        }
        Ok(())
    }

    /// The current frontier, in exploration order.
    pub fn graphs(&self) -> impl Iterator<Item = &ExecutionGraph> {
        self.graphs.iter()
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[derive(Clone, Copy, Debug)]
enum AccessKind {
    Read,
    Write,
}
