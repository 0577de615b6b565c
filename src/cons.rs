use crate::event::Event;
use crate::event_label::{AsEventLabel, Read, Write};
use crate::exec_graph::ExecutionGraph;
use crate::loc::Loc;
use crate::revisit::Revisit;
use crate::vector_clock::VectorClock;

// The candidate-filtering seam of the exploration.
//
// The intended semantics of consistent(G) is porf-acyclicity plus the full
// coherence axioms of the memory model. What is enforced today is only the
// causal part: a write can be an rf/co source for an event at `pos` iff it
// is not causally at-or-after `pos`. Acyclicity of the coherence order
// itself is *not* checked, so the candidate set over-approximates.
//
// TODO: enforce coherence-order acyclicity and release/acquire
// synchronization here once the label carries the access mode. Both checks
// belong in `admits_source` / `admits_revisit`, which every candidate and
// every backward revisit already flows through.

/// Pluggable consistency predicate applied at candidate selection and at
/// backward-revisit checking.
pub(crate) struct Consistency {}

impl Consistency {
    /// Returns whether a write with clock `w_clock` may serve as the rf/co
    /// source of an event inserted at `pos`.
    ///
    /// The write qualifies iff its causal history does not include `pos` or
    /// any later event of `pos`'s thread. At the live frontier this admits
    /// every same-location write; during replay after a cut it excludes
    /// writes that depend on the suffix being rebuilt.
    fn admits_source(&self, w_clock: &VectorClock, pos: Event) -> bool {
        !w_clock.contains(pos)
    }

    /// The causally-legal same-location write sources for an event that
    /// would be inserted at `pos`, in candidate order: the initialization
    /// event first, then cached writes in increasing stamp order.
    ///
    /// The initialization event is a legal source for every location, so the
    /// result is never empty on a well-formed graph; callers treat an empty
    /// result as an invariant violation.
    pub(crate) fn consistent_writes(
        &self,
        g: &ExecutionGraph,
        loc: &Loc,
        pos: Event,
        would_be: &VectorClock,
    ) -> Vec<Event> {
        let mut result = Vec::new();
        let init = Event::new_init();
        if g.label(init).clock().leq(would_be) {
            result.push(init);
        }
        for &w in g.writes_at(loc) {
            if self.admits_source(g.label(w).clock(), pos) {
                result.push(w);
            }
        }
        result
    }

    /// Returns whether switching `rlab` to read from `wlab` can yield a
    /// consistent graph.
    ///
    /// Checks that the write does not causally depend on the read (or on
    /// anything program-order after it); by transitivity of the clocks this
    /// covers the read's entire causal future. Coherence-related filtering
    /// is part of the TODO boundary above.
    pub(crate) fn admits_revisit(&self, rlab: &Read, wlab: &Write, rev: &Revisit) -> bool {
        debug_assert_eq!(rev.pos, rlab.as_event_label().pos());
        debug_assert_eq!(rev.rev, wlab.as_event_label().pos());
        wlab.loc() == rlab.loc() && self.admits_source(wlab.as_event_label().clock(), rev.pos)
    }
}
