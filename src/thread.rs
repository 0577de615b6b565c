//! Thread identifiers for events in an execution graph.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

/// A unique identifier for a thread of the program under test.
///
/// The set of valid thread ids is fixed when the [`Strategy`](crate::Strategy)
/// is constructed: `t0` up to (but excluding) `t{n_threads}`. Thread `t0` also
/// hosts the initialization event of every graph.
// Do not derive PartialOrd or Ord: a thread id is an opaque token handed out
// by the instrumentation layer, and nothing in the exploration may depend on
// the relative order of two thread ids. Candidate ordering uses stamps and
// explicit thread iteration order instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ThreadId {
    opaque_id: u32,
}

impl Serialize for ThreadId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("t{}", self.opaque_id))
    }
}

impl Display for ThreadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("t{}", self.opaque_id))
    }
}

pub struct ThreadIdFromStrError {
    msg: String,
}

impl Display for ThreadIdFromStrError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&self.msg)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = ThreadIdFromStrError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if let Some(num) = s.strip_prefix('t') {
            match num.parse::<u32>() {
                Ok(tid) => Ok(ThreadId { opaque_id: tid }),
                Err(_) => Err(ThreadIdFromStrError {
                    msg: format!("Can't parse {} as a number", &s),
                }),
            }
        } else {
            Err(ThreadIdFromStrError {
                msg: format!("`{}` should begin with `t`", &s),
            })
        }
    }
}

/// Construct a `ThreadId` from the numeric index reported by the
/// instrumentation layer.
///
/// The index must be below the `n_threads` the strategy was configured with;
/// [`Strategy::add_read_event`](crate::Strategy::add_read_event) and
/// [`Strategy::add_write_event`](crate::Strategy::add_write_event) reject
/// ids outside that range.
pub fn construct_thread_id(numeric_id: u32) -> ThreadId {
    ThreadId {
        opaque_id: numeric_id,
    }
}

/// The id of the thread that hosts the initialization event.
pub fn main_thread_id() -> ThreadId {
    construct_thread_id(0)
}

impl From<ThreadId> for u32 {
    fn from(tid: ThreadId) -> Self {
        tid.opaque_id
    }
}

impl From<ThreadId> for usize {
    fn from(tid: ThreadId) -> Self {
        tid.opaque_id as usize
    }
}
