use std::borrow::Borrow;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

/// A map backed by a vector of key-value pairs, preserving insertion order.
///
/// Variable collections in a control problem are small (a handful of
/// manipulated and controlled variables), and their iteration order is
/// load-bearing: the optimizer's parameter vector is built from, and
/// unpacked onto, the same traversal of the manipulated-variable names.
/// `VarMap` makes that order explicit -- it is always insertion order --
/// instead of depending on a hash map's arbitrary ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for VarMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K, V> VarMap<K, V> {
    /// Creates an empty `VarMap`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates an iterator over the key-value pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: PartialEq, V> VarMap<K, V> {
    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a value by anything the key type borrows as, so a
    /// `VarMap<String, V>` can be queried with a `&str` without
    /// allocating an owned key.
    pub fn get_by<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated, and
    /// the old value is returned; the key keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(index) = self.entries.iter().position(|(k, _)| k == &key) {
            let old = std::mem::replace(&mut self.entries[index], (key, value));
            Some(old.1)
        } else {
            self.entries.push((key, value));
            None
        }
    }
}

impl<K, V> FromIterator<(K, V)> for VarMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K, V> IntoIterator for VarMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
