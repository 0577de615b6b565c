use revgraph::{construct_thread_id, Config, Error, Event, ExecutionGraph, Strategy, ThreadId};

mod utils;

/// Test names are of the form X_X_..._Y where each of the X identifiers is
/// a string composed of the following characters:
///
///   - r: read
///   - w: write
///
/// while underscores denote thread separation. The last identifier Y, when
/// present, is a string containing extra information about the testcase.
/// For example:
///
///   - `w_r` is a program where thread 0 does a write and thread 1 a read
///     of the same location.
///   - `r_w_late` marks that the write is reported after the read.

fn t(i: u32) -> ThreadId {
    construct_thread_id(i)
}

fn frontier(s: &Strategy) -> Vec<&ExecutionGraph> {
    s.graphs().collect()
}

#[test]
fn w_r() {
    utils::init_log();
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    s.add_write_event("x", t(0)).unwrap();
    s.add_read_event("x", t(1)).unwrap();

    // the read observes either the initial value or the write, once each
    assert_eq!(s.graph_count(), 2);
    let rpos = Event::new(t(1), 0);
    let sources: Vec<_> = frontier(&s)
        .iter()
        .map(|g| g.reads_from(rpos).unwrap())
        .collect();
    assert_eq!(sources.len(), 2);
    assert!(sources.contains(&Event::new(t(0), 0)));
    assert!(sources.contains(&Event::new(t(0), 1)));
    // both sources live on the writer's thread
    assert!(sources.iter().all(|w| w.thread() == t(0)));

    let stats = s.stats();
    assert_eq!(stats.events, 2);
    assert_eq!(stats.forward_revisits, 1);
    assert_eq!(stats.backward_revisits, 0);
}

#[test]
fn r_w_late() {
    utils::init_log();
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    s.add_read_event("x", t(1)).unwrap();
    s.add_write_event("x", t(0)).unwrap();

    // same two outcomes as w_r, but the second is found by backward revisit
    assert_eq!(s.graph_count(), 2);
    let rpos = Event::new(t(1), 0);
    let sources: Vec<_> = frontier(&s)
        .iter()
        .map(|g| g.reads_from(rpos).unwrap())
        .collect();
    assert!(sources.contains(&Event::new(t(0), 0)));
    assert!(sources.contains(&Event::new(t(0), 1)));

    let stats = s.stats();
    assert_eq!(stats.forward_revisits, 0);
    assert_eq!(stats.backward_revisits, 1);
}

#[test]
fn rr_w_replay() {
    utils::init_log();
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    s.add_read_event("x", t(1)).unwrap();
    s.add_read_event("y", t(1)).unwrap();
    s.add_write_event("x", t(0)).unwrap();

    assert_eq!(s.graph_count(), 2);
    assert_eq!(s.stats().backward_revisits, 1);

    let init = Event::new(t(0), 0);
    let wpos = Event::new(t(0), 1);
    let rx = Event::new(t(1), 0);
    let ry = Event::new(t(1), 1);

    // the revisited graph cut the read of y away and replayed it, so both
    // graphs keep thread 1 at full length
    for g in frontier(&s) {
        assert_eq!(g.thread_size(t(1)), 2);
        assert_eq!(g.reads_from(ry), Some(init));
        assert_eq!(g.discarded_events(), 0);
    }
    let revisited = frontier(&s)
        .into_iter()
        .find(|g| g.reads_from(rx) == Some(wpos));
    assert!(revisited.is_some());
}

#[test]
fn w_rr() {
    utils::init_log();
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    s.add_write_event("x", t(0)).unwrap();
    s.add_read_event("x", t(1)).unwrap();
    s.add_read_event("x", t(1)).unwrap();

    // two reads with two candidate sources each
    assert_eq!(s.graph_count(), 4);
    let r0 = Event::new(t(1), 0);
    let r1 = Event::new(t(1), 1);
    let mut outcomes: Vec<(Event, Event)> = frontier(&s)
        .iter()
        .map(|g| (g.reads_from(r0).unwrap(), g.reads_from(r1).unwrap()))
        .collect();
    outcomes.sort_by_key(|(a, b)| (a.index(), b.index()));
    outcomes.dedup();
    assert_eq!(outcomes.len(), 4);
}

#[test]
fn w_w_coherence() {
    utils::init_log();
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    s.add_write_event("x", t(0)).unwrap();
    s.add_write_event("x", t(1)).unwrap();

    // the second write is placed either right after Init or after the first
    assert_eq!(s.graph_count(), 2);
    let w1 = Event::new(t(1), 0);
    let placements: Vec<_> = frontier(&s)
        .iter()
        .map(|g| g.writes_on(w1).unwrap())
        .collect();
    assert!(placements.contains(&Event::new(t(0), 0)));
    assert!(placements.contains(&Event::new(t(0), 1)));
}

#[test]
fn unknown_thread_is_rejected() {
    let mut s = Strategy::new(Config::builder().with_n_threads(2).build());
    let err = s.add_write_event("x", t(7)).unwrap_err();
    assert!(matches!(err, Error::UnknownThread { n_threads: 2, .. }));
    // the frontier is untouched
    assert_eq!(s.graph_count(), 1);
    assert_eq!(s.stats().events, 0);
}

#[test]
fn frontier_limit_is_enforced() {
    let mut s = Strategy::new(
        Config::builder()
            .with_n_threads(2)
            .with_max_graphs(1)
            .build(),
    );
    s.add_write_event("x", t(0)).unwrap();
    let err = s.add_read_event("x", t(1)).unwrap_err();
    assert!(matches!(err, Error::TooManyGraphs { limit: 1 }));
}

#[test]
fn exploration_is_deterministic() {
    let run = || {
        let mut s = Strategy::new(Config::builder().with_n_threads(3).build());
        s.add_read_event("x", t(1)).unwrap();
        s.add_write_event("y", t(2)).unwrap();
        s.add_read_event("y", t(1)).unwrap();
        s.add_write_event("x", t(0)).unwrap();
        s.add_write_event("x", t(2)).unwrap();
        s.graphs().map(|g| g.to_string()).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn thread_zero_hosts_init() {
    let s = Strategy::new(Config::builder().with_n_threads(2).build());
    let g = frontier(&s)[0];
    assert!(g.is_init(Event::new(t(0), 0)));
    assert_eq!(g.thread_size(t(0)), 1);
    assert_eq!(g.thread_size(t(1)), 0);
}
