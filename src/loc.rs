//! Location labels for memory-access events.

use core::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;

use dyn_clone::DynClone;
use dyn_eq::DynEq;
use dyn_hash::DynHash;

/// Anything usable as a location label: equality, hashing and cloning are all
/// a label needs. Strings, integers and tuples qualify out of the box.
pub trait Identifier: DynEq + DynClone + DynHash + Debug + Send {}
dyn_clone::clone_trait_object!(Identifier);
dyn_hash::hash_trait_object!(Identifier);
dyn_eq::eq_trait_object!(Identifier);

impl<T: Eq + Clone + Hash + Debug + Send + 'static> Identifier for T {}

/// A shared-memory location label, as reported by the instrumentation layer.
///
/// A `Loc` denotes a memory *location* only. Two accesses target the same
/// location exactly when their labels compare equal. Callers that need the
/// exploration to distinguish observed values as well must fold the value
/// into the identifier they pass (e.g. a `(name, value)` tuple).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Loc(Box<dyn Identifier>);

impl Loc {
    pub fn new<T: Identifier>(id: T) -> Self {
        Loc(Box::new(id))
    }
}

impl Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match() {
        let id1: Loc = Loc::new("foo".to_string());
        let id2: Loc = Loc::new("bar".to_string());
        let id3: Loc = Loc::new(42);
        let id4: Loc = Loc::new(42);
        assert!(id1 != id2);
        assert!(id2 != id3);
        assert!(id3 == id4);
    }

    #[test]
    fn test_display() {
        let id: Loc = Loc::new("foo".to_string());
        assert_eq!(format!("{:}", id), "\"foo\"")
    }

    #[test]
    fn test_clone() {
        let id1: Loc = Loc::new("foo".to_string());
        let id2: Loc = Loc::new(42);
        assert!(id1 == id1.clone());
        assert!(id1.clone() != id2);
    }

    #[test]
    fn test_value_in_label() {
        // location+value convention: distinct observed values are distinct labels
        let w1: Loc = Loc::new(("x", 1));
        let w2: Loc = Loc::new(("x", 2));
        assert!(w1 != w2);
        assert!(w1 == Loc::new(("x", 1)));
    }
}
