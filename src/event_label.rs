//! Labels of execution graph events

use std::fmt;

use crate::event::Event;
use crate::loc::Loc;
use crate::thread::main_thread_id;
use crate::vector_clock::VectorClock;

/// The label of one node of an execution graph: the initialization event,
/// a read, or a write.
#[derive(Clone)]
pub(crate) enum LabelEnum {
    Init(Init),
    Read(Read),
    Write(Write),
}

macro_rules! match_and_run {
    ( $lab:expr, $name:ident $( , $arg:ident )* ) => {
        match $lab {
            LabelEnum::Init(l) => l.as_event_label().$name($($arg),*),
            LabelEnum::Read(l) => l.as_event_label().$name($($arg),*),
            LabelEnum::Write(l) => l.as_event_label().$name($($arg),*),
        }
    };
}

macro_rules! match_and_run_mut {
    ( $lab:expr, $name:ident $( , $arg:ident )* ) => {
        match $lab {
            LabelEnum::Init(l) => l.as_event_label_mut().$name($($arg),*),
            LabelEnum::Read(l) => l.as_event_label_mut().$name($($arg),*),
            LabelEnum::Write(l) => l.as_event_label_mut().$name($($arg),*),
        }
    };
}

impl LabelEnum {
    pub(crate) fn pos(&self) -> Event {
        match_and_run!(self, pos)
    }

    pub(crate) fn stamped(&self) -> bool {
        match_and_run!(self, stamped)
    }

    pub(crate) fn stamp(&self) -> usize {
        match_and_run!(self, stamp)
    }

    pub(crate) fn set_stamp(&mut self, s: usize) {
        match_and_run_mut!(self, set_stamp, s)
    }

    /// The porf clock of the event: its program-order prefix plus the
    /// committed rf/co dependencies, each closed under causality.
    pub(crate) fn clock(&self) -> &VectorClock {
        match_and_run!(self, clock)
    }

    pub(crate) fn set_clock(&mut self, v: VectorClock) {
        match_and_run_mut!(self, set_clock, v)
    }

    /// Whether the event is a write (the initialization event counts).
    pub(crate) fn is_write(&self) -> bool {
        matches!(self, LabelEnum::Init(_) | LabelEnum::Write(_))
    }
}

impl fmt::Display for LabelEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelEnum::Init(lab) => write!(f, "{}", lab),
            LabelEnum::Read(lab) => write!(f, "{}", lab),
            LabelEnum::Write(lab) => write!(f, "{}", lab),
        }
    }
}

impl fmt::Debug for LabelEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelEnum::Init(lab) => write!(f, "{}", lab),
            LabelEnum::Read(lab) => write!(f, "{}", lab),
            LabelEnum::Write(lab) => write!(f, "{}", lab),
        }
    }
}

pub(crate) trait AsEventLabel {
    fn as_event_label(&self) -> &EventLabel;
    fn as_event_label_mut(&mut self) -> &mut EventLabel;
}

/// Fields shared by all label kinds.
#[derive(Clone, Debug)]
pub(crate) struct EventLabel {
    pos: Event,
    stamp: Option<usize>,
    clock: VectorClock,
}

impl EventLabel {
    fn new(p: Event) -> Self {
        Self {
            pos: p,
            stamp: None,
            clock: VectorClock::new(),
        }
    }

    fn init() -> Self {
        let pos = Event::new_init();
        let mut clock = VectorClock::new();
        clock.set_tid(main_thread_id());
        Self {
            pos,
            stamp: Some(0),
            clock,
        }
    }

    pub(crate) fn pos(&self) -> Event {
        self.pos
    }

    pub(crate) fn stamped(&self) -> bool {
        self.stamp.is_some()
    }

    pub(crate) fn stamp(&self) -> usize {
        self.stamp.unwrap()
    }

    pub(crate) fn set_stamp(&mut self, s: usize) {
        self.stamp = Some(s)
    }

    pub(crate) fn clock(&self) -> &VectorClock {
        &self.clock
    }

    pub(crate) fn set_clock(&mut self, v: VectorClock) {
        self.clock = v;
    }

    pub(crate) fn clock_mut(&mut self) -> &mut VectorClock {
        &mut self.clock
    }
}

/// The unique root write of a graph, at `(t0, 0)` with stamp 0. It is the
/// coherence-order and reads-from fallback for every location.
#[derive(Clone, Debug)]
pub(crate) struct Init {
    base: EventLabel,
}

impl Init {
    pub(crate) fn new() -> Self {
        Self {
            base: EventLabel::init(),
        }
    }
}

impl AsEventLabel for Init {
    fn as_event_label(&self) -> &EventLabel {
        &self.base
    }
    fn as_event_label_mut(&mut self) -> &mut EventLabel {
        &mut self.base
    }
}

impl fmt::Display for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Init", self.base.pos())
    }
}

/// A read of a shared location.
#[derive(Clone, Debug)]
pub(crate) struct Read {
    base: EventLabel,
    loc: Loc,
    /// The write this read observes. `None` only transiently, between
    /// construction and the commit of the edge.
    rf: Option<Event>,
}

impl Read {
    pub(crate) fn new(pos: Event, loc: Loc) -> Self {
        Self {
            base: EventLabel::new(pos),
            loc,
            rf: None,
        }
    }

    pub(crate) fn loc(&self) -> &Loc {
        &self.loc
    }

    pub(crate) fn rf(&self) -> Option<Event> {
        self.rf
    }

    pub(crate) fn set_rf(&mut self, w: Event) {
        self.rf = Some(w);
    }
}

impl AsEventLabel for Read {
    fn as_event_label(&self) -> &EventLabel {
        &self.base
    }
    fn as_event_label_mut(&mut self) -> &mut EventLabel {
        &mut self.base
    }
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rf {
            Some(w) => write!(f, "{}: R({}) [rf: {}]", self.base.pos(), self.loc, w),
            None => write!(f, "{}: R({}) [rf: ?]", self.base.pos(), self.loc),
        }
    }
}

/// A write to a shared location.
#[derive(Clone, Debug)]
pub(crate) struct Write {
    base: EventLabel,
    loc: Loc,
    /// The write immediately before this one in the location's coherence
    /// order. `None` only transiently, before the commit of the edge.
    co: Option<Event>,
}

impl Write {
    pub(crate) fn new(pos: Event, loc: Loc) -> Self {
        Self {
            base: EventLabel::new(pos),
            loc,
            co: None,
        }
    }

    pub(crate) fn loc(&self) -> &Loc {
        &self.loc
    }

    pub(crate) fn co(&self) -> Option<Event> {
        self.co
    }

    pub(crate) fn set_co(&mut self, w: Event) {
        self.co = Some(w);
    }
}

impl AsEventLabel for Write {
    fn as_event_label(&self) -> &EventLabel {
        &self.base
    }
    fn as_event_label_mut(&mut self) -> &mut EventLabel {
        &mut self.base
    }
}

impl fmt::Display for Write {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.co {
            Some(w) => write!(f, "{}: W({}) [co: {}]", self.base.pos(), self.loc, w),
            None => write!(f, "{}: W({}) [co: ?]", self.base.pos(), self.loc),
        }
    }
}
