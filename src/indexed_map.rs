use serde::{Deserialize, Serialize};

/// A sparse vector keyed by small integer indices.
///
/// Backs both vector clocks (thread -> latest index) and the per-thread
/// event sequences of a graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IndexedMap<T>(Vec<Option<T>>);

impl<T> IndexedMap<T> {
    pub(crate) fn new() -> Self {
        IndexedMap(Vec::new())
    }

    pub(crate) fn set(&mut self, ind: usize, value: T) {
        if self.0.len() <= ind {
            self.0.resize_with(ind + 1, Default::default);
        }
        self.0[ind] = Some(value);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(|v| v.as_ref())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.0.iter_mut().filter_map(|v| v.as_mut())
    }

    pub(crate) fn enumerate(&self) -> impl Iterator<Item = (usize, &T)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
    }

    pub(crate) fn get(&self, ind: usize) -> Option<&T> {
        self.0.get(ind).and_then(|v| v.as_ref())
    }

    pub(crate) fn get_mut(&mut self, ind: usize) -> Option<&mut T> {
        self.0.get_mut(ind).and_then(|v| v.as_mut())
    }
}
