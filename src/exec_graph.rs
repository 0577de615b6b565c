use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::cons::Consistency;
use crate::event::Event;
use crate::event_label::*;
use crate::indexed_map::IndexedMap;
use crate::loc::Loc;
use crate::revisit::{Revisit, RevisitEnum};
use crate::thread::{construct_thread_id, ThreadId};
use crate::vector_clock::VectorClock;
use crate::Error;

/// Encapsulates the events of a single thread
#[derive(Clone, Debug)]
pub(crate) struct ThreadInfo {
    tid: ThreadId,
    /// Program order. Thread 0 holds the Init label at index 0.
    pub(crate) labels: Vec<LabelEnum>,
    /// Events set aside (not discarded) by the most recent cut, awaiting
    /// replay against the new rf edge.
    pub(crate) removed: Vec<LabelEnum>,
}

/// One consistent partial order over the events observed so far.
///
/// The graph owns its events outright; all cross-references are positional
/// [`Event`] handles, so a `clone()` is a fully independent graph whose edges
/// resolve only within itself.
#[derive(Clone, Debug)]
pub struct ExecutionGraph {
    pub(crate) threads: IndexedMap<ThreadInfo>,
    stamp: usize,
    /// Per-location caches of write/read positions, in increasing stamp
    /// order. Init is kept out of the caches; candidate selection adds it
    /// explicitly.
    writes: HashMap<Loc, Vec<Event>>,
    reads: HashMap<Loc, Vec<Event>>,
    /// Events dropped (not replayed) after backward-revisit cuts.
    discarded: usize,
}

impl ExecutionGraph {
    pub(crate) fn new(n_threads: usize) -> ExecutionGraph {
        let mut threads = IndexedMap::new();
        for i in 0..n_threads {
            let tid = construct_thread_id(i as u32);
            let labels = if i == 0 {
                vec![LabelEnum::Init(Init::new())]
            } else {
                vec![]
            };
            threads.set(
                i,
                ThreadInfo {
                    tid,
                    labels,
                    removed: vec![],
                },
            );
        }
        ExecutionGraph {
            threads,
            stamp: 0,
            writes: HashMap::new(),
            reads: HashMap::new(),
            discarded: 0,
        }
    }

    /// Find the ThreadInfo structure for a thread, or panic with an error message.
    pub(crate) fn get_thr(&self, tid: &ThreadId) -> &ThreadInfo {
        self.get_thr_opt(tid).unwrap_or_else(|| {
            panic!(
                "Can't find thread {} in graph with thread ids {:?}",
                *tid,
                self.threads.iter().map(|t| t.tid).collect::<Vec<_>>()
            )
        })
    }

    pub(crate) fn get_thr_opt(&self, tid: &ThreadId) -> Option<&ThreadInfo> {
        self.threads.get(usize::from(*tid))
    }

    pub(crate) fn get_thr_mut(&mut self, tid: &ThreadId) -> &mut ThreadInfo {
        self.threads.get_mut(usize::from(*tid)).unwrap_or_else(|| {
            panic!("Can't find thread {}", *tid);
        })
    }

    /// Number of events in a thread's program order (thread 0 includes Init).
    pub fn thread_size(&self, t: ThreadId) -> usize {
        self.get_thr(&t).labels.len()
    }

    /// Whether the graph holds an event at this position.
    pub fn contains(&self, e: Event) -> bool {
        self.get_thr_opt(&e.thread).is_some() && (e.index as usize) < self.thread_size(e.thread)
    }

    pub(crate) fn next_stamp(&mut self) -> usize {
        self.stamp += 1;
        self.stamp
    }

    pub(crate) fn label(&self, e: Event) -> &LabelEnum {
        &self.get_thr(&e.thread).labels[e.index as usize]
    }

    pub(crate) fn label_mut(&mut self, e: Event) -> &mut LabelEnum {
        &mut self.get_thr_mut(&e.thread).labels[e.index as usize]
    }

    pub(crate) fn read_label(&self, e: Event) -> Option<&Read> {
        if let LabelEnum::Read(l) = self.label(e) {
            Some(l)
        } else {
            None
        }
    }

    pub(crate) fn read_label_mut(&mut self, e: Event) -> Option<&mut Read> {
        if let LabelEnum::Read(l) = self.label_mut(e) {
            Some(l)
        } else {
            None
        }
    }

    pub(crate) fn write_label(&self, e: Event) -> Option<&Write> {
        if let LabelEnum::Write(l) = self.label(e) {
            Some(l)
        } else {
            None
        }
    }

    /// The position of the initialization event.
    pub fn init_event(&self) -> Event {
        Event::new_init()
    }

    /// Whether the event at `e` is the initialization event.
    pub fn is_init(&self, e: Event) -> bool {
        matches!(self.label(e), LabelEnum::Init(_))
    }

    /// The write a read observes, or `None` for non-read positions.
    pub fn reads_from(&self, e: Event) -> Option<Event> {
        self.read_label(e).and_then(|r| r.rf())
    }

    /// The coherence predecessor of a write, or `None` for non-write
    /// positions and for Init.
    pub fn writes_on(&self, e: Event) -> Option<Event> {
        self.write_label(e).and_then(|w| w.co())
    }

    /// Events dropped by backward-revisit cuts over this graph's history.
    pub fn discarded_events(&self) -> usize {
        self.discarded
    }

    pub(crate) fn writes_at(&self, loc: &Loc) -> &[Event] {
        self.writes.get(loc).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn reads_at(&self, loc: &Loc) -> &[Event] {
        self.reads.get(loc).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn next_pos(&self, tid: ThreadId) -> Event {
        Event::new(tid, self.thread_size(tid) as u32)
    }

    /// The view an event at `pos` would have from program order alone: its
    /// po-predecessor's full causal history (Init's for a thread's first
    /// event) plus the event itself. Excludes any rf/co edge of the event,
    /// which is exactly the "before-view" a backward revisit needs.
    pub(crate) fn po_view(&self, pos: Event) -> VectorClock {
        let prev_clock = if pos.index == 0 {
            self.label(Event::new_init()).clock()
        } else {
            self.label(pos.prev()).clock()
        };
        let mut v = prev_clock.clone();
        v.update_or_set(pos);
        v
    }

    /// Commit the reads-from edge of a not-yet-inserted read.
    ///
    /// This is the one place an rf edge becomes a causal edge: the source
    /// write's clock is merged into the read's. Returns the updated clock.
    pub(crate) fn commit_rf<'a>(&self, rlab: &'a mut Read, w: Event) -> &'a VectorClock {
        debug_assert!(rlab.rf().is_none(), "rf is set-once per graph");
        debug_assert!(self.label(w).is_write());
        rlab.set_rf(w);
        let w_clock = self.label(w).clock();
        rlab.as_event_label_mut().clock_mut().update(w_clock);
        rlab.as_event_label().clock()
    }

    /// Commit the coherence-predecessor edge of a not-yet-inserted write.
    /// The counterpart of [`commit_rf`](Self::commit_rf) for co edges.
    pub(crate) fn commit_co<'a>(&self, wlab: &'a mut Write, w: Event) -> &'a VectorClock {
        debug_assert!(wlab.co().is_none(), "co is set-once per graph");
        debug_assert!(self.label(w).is_write());
        wlab.set_co(w);
        let w_clock = self.label(w).clock();
        wlab.as_event_label_mut().clock_mut().update(w_clock);
        wlab.as_event_label().clock()
    }

    /// Append a label to its thread, converting program order into a causal
    /// guarantee: the label's clock absorbs its po-predecessor's clock and
    /// then gains its own position.
    pub(crate) fn add_event(&mut self, mut lab: LabelEnum) -> Result<Event, Error> {
        let pos = lab.pos();
        let expected = self.thread_size(pos.thread) as u32;
        if pos.index != expected {
            return Err(Error::PositionGap { pos, expected });
        }
        if !lab.stamped() {
            let s = self.next_stamp();
            lab.set_stamp(s);
        }

        let mut clock = lab.clock().clone();
        let prev_clock = if pos.index == 0 {
            self.label(Event::new_init()).clock()
        } else {
            self.label(pos.prev()).clock()
        };
        clock.update(prev_clock);
        clock.update_or_set(pos);
        lab.set_clock(clock);

        self.register(&lab);
        self.get_thr_mut(&pos.thread).labels.push(lab);
        Ok(pos)
    }

    // Cache the event in the per-location map
    fn register(&mut self, lab: &LabelEnum) {
        match lab {
            LabelEnum::Read(rlab) => {
                self.reads
                    .entry(rlab.loc().clone())
                    .or_default()
                    .push(lab.pos());
            }
            LabelEnum::Write(wlab) => {
                self.writes
                    .entry(wlab.loc().clone())
                    .or_default()
                    .push(lab.pos());
            }
            LabelEnum::Init(_) => {}
        }
    }

    /// Record that `tid` performed a read of `loc`.
    ///
    /// Commits this graph to the first causally-legal source and spawns one
    /// forward-revisit branch per remaining candidate.
    pub(crate) fn add_read_event(
        &mut self,
        loc: &Loc,
        tid: ThreadId,
        checker: &Consistency,
    ) -> Result<Vec<(RevisitEnum, ExecutionGraph)>, Error> {
        let pos = self.next_pos(tid);
        let would_be = self.po_view(pos);
        let cands = checker.consistent_writes(self, loc, pos, &would_be);
        let Some((&first, rest)) = cands.split_first() else {
            return Err(Error::NoConsistentWrite {
                pos,
                loc: loc.to_string(),
            });
        };
        trace!("read {} of {}: {} candidate sources", pos, loc, cands.len());

        let mut branches = Vec::new();
        for &w in rest {
            let mut ng = self.clone();
            let mut rlab = Read::new(pos, loc.clone());
            ng.commit_rf(&mut rlab, w);
            ng.add_event(LabelEnum::Read(rlab))?;
            branches.push((RevisitEnum::new_forward(pos, w), ng));
        }

        let mut rlab = Read::new(pos, loc.clone());
        self.commit_rf(&mut rlab, first);
        self.add_event(LabelEnum::Read(rlab))?;
        Ok(branches)
    }

    /// Record that `tid` performed a write to `loc`.
    ///
    /// Symmetric to [`add_read_event`](Self::add_read_event) over coherence
    /// placements; additionally runs backward-revisit checking rooted at the
    /// new write on this graph and on every forward-revisit clone, since a
    /// new coherence position can retroactively invalidate committed reads.
    pub(crate) fn add_write_event(
        &mut self,
        loc: &Loc,
        tid: ThreadId,
        checker: &Consistency,
    ) -> Result<Vec<(RevisitEnum, ExecutionGraph)>, Error> {
        let pos = self.next_pos(tid);
        let would_be = self.po_view(pos);
        let cands = checker.consistent_writes(self, loc, pos, &would_be);
        let Some((&first, rest)) = cands.split_first() else {
            return Err(Error::NoConsistentWrite {
                pos,
                loc: loc.to_string(),
            });
        };
        trace!(
            "write {} to {}: {} candidate placements",
            pos,
            loc,
            cands.len()
        );

        let mut branches = Vec::new();
        for &w in rest {
            let mut ng = self.clone();
            let mut wlab = Write::new(pos, loc.clone());
            ng.commit_co(&mut wlab, w);
            ng.add_event(LabelEnum::Write(wlab))?;
            let brs = ng.backward_revisits(pos, checker)?;
            branches.push((RevisitEnum::new_forward(pos, w), ng));
            branches.extend(brs);
        }

        let mut wlab = Write::new(pos, loc.clone());
        self.commit_co(&mut wlab, first);
        self.add_event(LabelEnum::Write(wlab))?;
        branches.extend(self.backward_revisits(pos, checker)?);
        Ok(branches)
    }

    /// Compute the backward revisits induced by the just-appended write at
    /// `wpos`: one branch per committed same-location read that could have
    /// observed it instead.
    fn backward_revisits(
        &self,
        wpos: Event,
        checker: &Consistency,
    ) -> Result<Vec<(RevisitEnum, ExecutionGraph)>, Error> {
        let wlab = self.write_label(wpos).unwrap();
        let loc = wlab.loc().clone();

        let mut out = Vec::new();
        // Reverse stamp order: the caches are stamp-sorted.
        for &r in self.reads_at(&loc).iter().rev() {
            if r == wpos {
                continue;
            }
            let rev = Revisit::new(r, wpos);
            let rlab = self.read_label(r).unwrap();
            if !checker.admits_revisit(rlab, wlab, &rev) {
                continue;
            }

            debug!("backward revisit: {} <= {}", r, wpos);
            let v = self.revisit_view(&rev);
            let mut ng = self.copy_to_view(&v);
            ng.change_rf(r, wpos);
            ng.replay_removed(checker)?;
            out.push((RevisitEnum::new_backward(r, wpos), ng));
        }
        Ok(out)
    }

    /// The frontier at which a backward revisit cuts: the revisited read's
    /// before-view joined with the revisitor's porf view.
    pub(crate) fn revisit_view(&self, rev: &Revisit) -> VectorClock {
        let mut v = self.po_view(rev.pos);
        v.update(self.label(rev.rev).clock());
        v
    }

    /// Remove, per thread, every event at an index beyond the view's
    /// frontier, setting the suffix aside for replay rather than destroying
    /// it. Caches are trimmed to the surviving events.
    pub(crate) fn cut_to_view(&mut self, v: &VectorClock) {
        self.writes
            .values_mut()
            .for_each(|vec| vec.retain(|e| v.contains(*e)));
        self.writes.retain(|_, vec| !vec.is_empty());
        self.reads
            .values_mut()
            .for_each(|vec| vec.retain(|e| v.contains(*e)));
        self.reads.retain(|_, vec| !vec.is_empty());

        for thr in self.threads.iter_mut() {
            let keep = v.get(thr.tid).map_or(0, |i| i as usize + 1);
            let keep = keep.min(thr.labels.len());
            thr.removed = thr.labels.drain(keep..).collect();
        }
    }

    pub(crate) fn copy_to_view(&self, v: &VectorClock) -> ExecutionGraph {
        // Clone and then cut. This might copy events that are dropped right
        // away but it avoids duplicating the cache bookkeeping of
        // cut_to_view.
        let mut other = self.clone();
        other.cut_to_view(v);
        other
    }

    /// Rewire an existing read to observe `w`, recomputing its clock from
    /// scratch (program-order past joined with the new source's clock).
    ///
    /// Callers must have cut away the read's causal future first; kept
    /// events never depend on the read, so no other clock needs fixing.
    pub(crate) fn change_rf(&mut self, r: Event, w: Event) {
        debug_assert!(self.label(w).is_write());
        let mut clock = self.po_view(r);
        clock.update(self.label(w).clock());
        let rlab = self.read_label_mut(r).unwrap();
        rlab.set_rf(w);
        rlab.as_event_label_mut().set_clock(clock);
    }

    /// Replay the events set aside by the last cut, in stamp order.
    ///
    /// Contract: an event is re-inserted iff its previously committed edge
    /// target still exists and is still a member of the freshly recomputed
    /// candidate set; it then recommits to the *same* target. The first
    /// event of a thread that fails the check discards the rest of that
    /// thread's suffix, keeping program order gap-free. Replay never spawns
    /// further branches.
    pub(crate) fn replay_removed(&mut self, checker: &Consistency) -> Result<(), Error> {
        let mut pending: Vec<LabelEnum> = Vec::new();
        for thr in self.threads.iter_mut() {
            pending.append(&mut thr.removed);
        }
        if pending.is_empty() {
            return Ok(());
        }
        pending.sort_by_key(|lab| lab.stamp());

        let mut dead_threads: HashSet<ThreadId> = HashSet::new();
        for lab in pending {
            let pos = lab.pos();
            if dead_threads.contains(&pos.thread) {
                self.discarded += 1;
                continue;
            }
            debug_assert_eq!(pos, self.next_pos(pos.thread));

            let (loc, target) = match &lab {
                LabelEnum::Read(rlab) => (rlab.loc().clone(), rlab.rf()),
                LabelEnum::Write(wlab) => (wlab.loc().clone(), wlab.co()),
                LabelEnum::Init(_) => unreachable!("Init is never cut away"),
            };
            let target = target.expect("cut-away events carry committed edges");

            let would_be = self.po_view(pos);
            let consistent = self.contains(target)
                && checker
                    .consistent_writes(self, &loc, pos, &would_be)
                    .contains(&target);
            if !consistent {
                trace!("replay: discarding {} and its thread suffix", pos);
                dead_threads.insert(pos.thread);
                self.discarded += 1;
                continue;
            }

            // Re-inserted events keep their original stamps, so replay
            // preserves the graph-wide stamp order of surviving events.
            match lab {
                LabelEnum::Read(ref old) => {
                    let mut new_lab = Read::new(pos, loc);
                    new_lab.as_event_label_mut().set_stamp(old.as_event_label().stamp());
                    self.commit_rf(&mut new_lab, target);
                    self.add_event(LabelEnum::Read(new_lab))?;
                }
                LabelEnum::Write(ref old) => {
                    let mut new_lab = Write::new(pos, loc);
                    new_lab.as_event_label_mut().set_stamp(old.as_event_label().stamp());
                    self.commit_co(&mut new_lab, target);
                    self.add_event(LabelEnum::Write(new_lab))?;
                }
                LabelEnum::Init(_) => unreachable!(),
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Printing exec graph")?;
        for thread_info in self.threads.iter() {
            writeln!(f, "thread {}:", thread_info.tid)?;
            for lab in thread_info.labels.iter() {
                writeln!(f, "\t{}", lab)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::main_thread_id;

    fn t(i: u32) -> ThreadId {
        construct_thread_id(i)
    }

    fn x() -> Loc {
        Loc::new("x")
    }

    fn y() -> Loc {
        Loc::new("y")
    }

    #[test]
    fn program_order_clock_is_monotone() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        for _ in 0..3 {
            g.add_write_event(&x(), t(0), &checker).unwrap();
        }
        // each event's clock strictly dominates its po-predecessor's
        for i in 2..4u32 {
            let prev = g.label(Event::new(t(0), i - 1)).clock();
            let cur = g.label(Event::new(t(0), i)).clock();
            assert!(prev.leq(cur));
            assert!(!cur.leq(prev));
            assert_eq!(cur.get(t(0)), Some(i));
        }
    }

    #[test]
    fn committed_source_is_first_candidate() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        g.add_write_event(&x(), t(0), &checker).unwrap();
        let rpos = Event::new(t(1), 0);
        let would_be = g.po_view(rpos);
        let cands = checker.consistent_writes(&g, &x(), rpos, &would_be);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0], g.init_event());
        // the chosen source's clock is below the read's pre-assignment clock
        assert!(g.label(cands[0]).clock().leq(&would_be));

        g.add_read_event(&x(), t(1), &checker).unwrap();
        assert_eq!(g.reads_from(rpos), Some(g.init_event()));
    }

    #[test]
    fn read_branches_once_per_extra_candidate() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        assert!(g.add_write_event(&x(), t(0), &checker).unwrap().is_empty());
        let branches = g.add_read_event(&x(), t(1), &checker).unwrap();
        // two candidates (Init and the write) => exactly one branch
        assert_eq!(branches.len(), 1);
        let (rev, ng) = &branches[0];
        assert!(!rev.is_backward());
        assert_eq!(ng.reads_from(Event::new(t(1), 0)), Some(Event::new(t(0), 1)));
    }

    #[test]
    fn commit_rf_merges_source_clock() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        g.add_write_event(&x(), t(0), &checker).unwrap();
        let wpos = Event::new(t(0), 1);

        let rpos = Event::new(t(1), 0);
        let mut rlab = Read::new(rpos, x());
        let clock = g.commit_rf(&mut rlab, wpos).clone();
        assert!(g.label(wpos).clock().leq(&clock));
        assert_eq!(rlab.rf(), Some(wpos));
    }

    #[test]
    fn clone_is_independent() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        g.add_write_event(&x(), t(0), &checker).unwrap();
        g.add_read_event(&x(), t(1), &checker).unwrap();

        let mut c = g.clone();
        assert_eq!(format!("{}", g), format!("{}", c));
        // re-cloning is structurally a no-op
        assert_eq!(format!("{}", c.clone()), format!("{}", c));

        c.add_write_event(&y(), t(1), &checker).unwrap();
        assert_eq!(c.thread_size(t(1)), 2);
        assert_eq!(g.thread_size(t(1)), 1);
        // the original's edges are untouched
        assert_eq!(g.reads_from(Event::new(t(1), 0)), Some(g.init_event()));
    }

    #[test]
    fn cut_sets_suffix_aside() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        g.add_write_event(&x(), t(0), &checker).unwrap();
        g.add_write_event(&y(), t(0), &checker).unwrap();
        g.add_read_event(&x(), t(1), &checker).unwrap();

        // keep Init + first write on t0, nothing on t1
        let mut v = VectorClock::new();
        v.update_or_set(Event::new(t(0), 1));
        let c = g.copy_to_view(&v);

        assert_eq!(c.thread_size(t(0)), 2);
        assert_eq!(c.thread_size(t(1)), 0);
        assert_eq!(c.get_thr(&t(0)).removed.len(), 1);
        assert_eq!(c.get_thr(&t(1)).removed.len(), 1);
        assert_eq!(c.writes_at(&y()), &[] as &[Event]);
        // the original is untouched
        assert_eq!(g.thread_size(t(0)), 3);
        assert_eq!(g.thread_size(t(1)), 1);
    }

    #[test]
    fn backward_revisit_rewires_committed_read() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        // the read commits to Init before any write exists
        assert!(g.add_read_event(&x(), t(1), &checker).unwrap().is_empty());
        let rpos = Event::new(t(1), 0);
        assert_eq!(g.reads_from(rpos), Some(g.init_event()));

        // the later write revisits it
        let branches = g.add_write_event(&x(), t(0), &checker).unwrap();
        assert_eq!(branches.len(), 1);
        let (rev, ng) = &branches[0];
        assert!(rev.is_backward());
        assert_eq!(ng.reads_from(rpos), Some(Event::new(t(0), 1)));
        // this graph keeps its original commitment
        assert_eq!(g.reads_from(rpos), Some(g.init_event()));
    }

    #[test]
    fn backward_revisit_replays_independent_read() {
        let checker = Consistency {};
        let mut g = ExecutionGraph::new(2);
        g.add_read_event(&x(), t(1), &checker).unwrap();
        g.add_read_event(&y(), t(1), &checker).unwrap();

        let branches = g.add_write_event(&x(), t(0), &checker).unwrap();
        assert_eq!(branches.len(), 1);
        let ng = &branches[0].1;
        // the read of y was cut away and replayed with its old source
        assert_eq!(ng.thread_size(t(1)), 2);
        assert_eq!(ng.reads_from(Event::new(t(1), 0)), Some(Event::new(t(0), 1)));
        assert_eq!(ng.reads_from(Event::new(t(1), 1)), Some(ng.init_event()));
        assert_eq!(ng.discarded_events(), 0);
    }

    #[test]
    fn main_thread_hosts_init() {
        let g = ExecutionGraph::new(3);
        assert_eq!(g.thread_size(main_thread_id()), 1);
        assert!(g.is_init(g.init_event()));
        assert_eq!(g.writes_on(g.init_event()), None);
        assert_eq!(g.label(g.init_event()).stamp(), 0);
    }
}
