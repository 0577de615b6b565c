//! Revisiting utilities

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// The two ways an exploration branch comes into being. Both carry the same
/// info, but the driver counts and logs them separately.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) enum RevisitEnum {
    /// A not-yet-appended event takes an alternative rf/co placement.
    Forward(Revisit),
    /// A new write retroactively becomes the rf source of an older read.
    Backward(Revisit),
}

impl RevisitEnum {
    /// forward revisit of pos (read or write) with alternative placement
    pub(crate) fn new_forward(pos: Event, placement: Event) -> Self {
        RevisitEnum::Forward(Revisit {
            pos,
            rev: placement,
        })
    }

    /// backward revisit of a read by a write
    pub(crate) fn new_backward(read: Event, write: Event) -> Self {
        RevisitEnum::Backward(Revisit {
            pos: read,
            rev: write,
        })
    }

    fn get_revisit(&self) -> &Revisit {
        match self {
            RevisitEnum::Forward(r) => r,
            RevisitEnum::Backward(r) => r,
        }
    }

    pub(crate) fn pos(&self) -> Event {
        self.get_revisit().pos
    }

    pub(crate) fn rev(&self) -> Event {
        self.get_revisit().rev
    }

    pub(crate) fn is_backward(&self) -> bool {
        matches!(self, RevisitEnum::Backward(_))
    }
}

/// One revisit: an event whose rf/co placement changes, and the placement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Revisit {
    /// the event whose placement (rf or co choice) changes
    pub(crate) pos: Event,
    /// the placement (rf or co choice)
    pub(crate) rev: Event,
}

impl Revisit {
    pub(crate) fn new(pos: Event, rev: Event) -> Self {
        Self { pos, rev }
    }
}
