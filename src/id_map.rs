//! Bidirectional old/new element correspondence for one duplication pass.
use std::collections::BTreeMap;

use crate::elements::ElemId;

/// Maps old elements to their copies and copies back to their originals.
/// Lookups do not distinguish direction; a miss is an expected outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityMap<K: Ord + Copy> {
    old_to_new: BTreeMap<K, K>,
    new_to_old: BTreeMap<K, K>,
}

/// Identity map over elements of any kind, as exposed through operator slots.
pub type ElemMap = IdentityMap<ElemId>;

impl<K: Ord + Copy> Default for IdentityMap<K> {
    fn default() -> Self {
        Self {
            old_to_new: BTreeMap::new(),
            new_to_old: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> IdentityMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `old <-> new`. Last write wins.
    pub fn insert(&mut self, old: K, new: K) {
        self.old_to_new.insert(old, new);
        self.new_to_old.insert(new, old);
    }

    /// Counterpart of `key`, whichever side of the map it is on.
    pub fn lookup(&self, key: K) -> Option<K> {
        self.old_to_new
            .get(&key)
            .or_else(|| self.new_to_old.get(&key))
            .copied()
    }

    pub fn new_of(&self, old: K) -> Option<K> {
        self.old_to_new.get(&old).copied()
    }

    pub fn old_of(&self, new: K) -> Option<K> {
        self.new_to_old.get(&new).copied()
    }

    /// Number of `old -> new` pairs.
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }

    /// `(old, new)` pairs ordered by old key.
    pub fn pairs(&self) -> impl Iterator<Item = (K, K)> + '_ {
        self.old_to_new.iter().map(|(old, new)| (*old, *new))
    }

    /// Replace the `old -> new` entry with `new -> new`, for when `old` is
    /// about to disappear but consumers must still find the copy.
    pub fn rekey_to_new(&mut self, old: K) {
        if let Some(new) = self.old_to_new.remove(&old) {
            self.new_to_old.remove(&new);
            self.insert(new, new);
        }
    }

    /// Convert keys and values into a wider key type, e.g. [`ElemId`].
    pub fn map_into<J: Ord + Copy + From<K>>(&self) -> IdentityMap<J> {
        let mut map = IdentityMap::new();
        for (old, new) in self.pairs() {
            map.insert(J::from(old), J::from(new));
        }
        map
    }
}

impl ElemMap {
    /// Merge every pair of `other` into this map.
    pub fn extend_from(&mut self, other: &ElemMap) {
        for (old, new) in other.pairs() {
            self.insert(old, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeId, VertId};

    #[test]
    fn test_lookup_both_directions() {
        let mut map = IdentityMap::new();
        map.insert(VertId(0), VertId(10));
        map.insert(VertId(1), VertId(11));

        assert_eq!(map.lookup(VertId(0)), Some(VertId(10)));
        assert_eq!(map.lookup(VertId(11)), Some(VertId(1)));
        assert_eq!(map.lookup(VertId(5)), None);
        for (old, new) in map.pairs() {
            assert_eq!(map.lookup(map.lookup(old).unwrap()), Some(old));
            assert_eq!(map.lookup(map.lookup(new).unwrap()), Some(new));
        }
    }

    #[test]
    fn test_rekey_keeps_new_reachable() {
        let mut map = IdentityMap::new();
        map.insert(EdgeId(2), EdgeId(7));
        map.rekey_to_new(EdgeId(2));

        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(EdgeId(2)), None);
        assert_eq!(map.lookup(EdgeId(7)), Some(EdgeId(7)));
        assert_eq!(map.pairs().collect::<Vec<_>>(), vec![(EdgeId(7), EdgeId(7))]);
    }

    #[test]
    fn test_map_into_elem_map() {
        let mut map = IdentityMap::new();
        map.insert(VertId(3), VertId(4));

        let elem_map: ElemMap = map.map_into();
        assert_eq!(
            elem_map.lookup(ElemId::Vert(VertId(4))),
            Some(ElemId::Vert(VertId(3)))
        );
    }
}
