//! Map and set containers shared by the native and intermediate models.
//!
//! Both are `indexmap` collections: lookups hash, iteration follows
//! insertion order, and equality ignores order. Their own `Hash` impls are
//! order-independent so maps and sets can themselves be keys.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::{map, set, IndexMap, IndexSet};

/// Sum of per-item hashes, independent of iteration order.
fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0, u64::wrapping_add)
}

/// Key/value container with unique keys.
#[derive(Clone)]
pub struct Map<V> {
    entries: IndexMap<V, V>,
}

impl<V> Default for Map<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V: Hash + Eq> Map<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a pair, returning the previous value when the key was present.
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, key: V, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &V) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &V) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &V) -> Option<V> {
        self.entries.shift_remove(key)
    }
}

impl<V> Map<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> map::Iter<'_, V, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> map::Keys<'_, V, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> map::Values<'_, V, V> {
        self.entries.values()
    }
}

impl<V: Hash + Eq> PartialEq for Map<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: Hash + Eq> Eq for Map<V> {}

impl<V: Hash> Hash for Map<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        state.write_u64(unordered_hash(self.entries.iter()));
    }
}

impl<V: fmt::Debug> fmt::Debug for Map<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<V: Hash + Eq> FromIterator<(V, V)> for Map<V> {
    fn from_iter<I: IntoIterator<Item = (V, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for Map<V> {
    type Item = (V, V);
    type IntoIter = map::IntoIter<V, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Container of unique members.
#[derive(Clone)]
pub struct Set<V> {
    items: IndexSet<V>,
}

impl<V> Default for Set<V> {
    fn default() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }
}

impl<V: Hash + Eq> Set<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member; returns `false` if an equal member was already present.
    pub fn insert(&mut self, item: V) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &V) -> bool {
        self.items.contains(item)
    }

    pub fn remove(&mut self, item: &V) -> bool {
        self.items.shift_remove(item)
    }
}

impl<V> Set<V> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> set::Iter<'_, V> {
        self.items.iter()
    }
}

impl<V: Hash + Eq> PartialEq for Set<V> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<V: Hash + Eq> Eq for Set<V> {}

impl<V: Hash> Hash for Set<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        state.write_u64(unordered_hash(self.items.iter()));
    }
}

impl<V: fmt::Debug> fmt::Debug for Set<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<V: Hash + Eq> FromIterator<V> for Set<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for Set<V> {
    type Item = V;
    type IntoIter = set::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a Set<V> {
    type Item = &'a V;
    type IntoIter = set::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
