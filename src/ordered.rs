/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Insertion-ordered maps used by every grouping in the crate.
//!
//! [`OrderedMap`] keeps entries in a `Vec` in first-insertion order and uses a
//! `hashbrown::HashMap` index for keyed lookup. Iteration order is a property
//! of the input, never of the hasher.
//!
//! [`OrderedMultiMap`] is the `key → Vec<value>` specialisation the aggregator
//! uses: values under one key stay in the order they were pushed.

use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;

use hashbrown::HashMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── OrderedMap ─────────────────────────────────────────────────────────────

/// Map that remembers first-insertion order.
///
/// Re-inserting an existing key replaces the value in place; the key keeps
/// its original position.
#[derive(Clone)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K, V> OrderedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Construct an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the map has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keyed lookup.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Mutable keyed lookup.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// `true` if `key` has been inserted.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or replace. Returns the previous value if the key existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&i) => Some(core::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Value for `key`, inserting `make()` at the end if the key is new.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key.clone(), i);
                self.entries.push((key, make()));
                i
            }
        };
        &mut self.entries[i].1
    }

    /// Position of `key` in insertion order.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    /// Iterate `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K, V> Default for OrderedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    /// Two maps are equal when they hold the same entries in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ─── OrderedMultiMap ────────────────────────────────────────────────────────

/// Key → ordered list of values. Values under a key keep push order.
pub type OrderedMultiMap<K, V> = OrderedMap<K, Vec<V>>;

impl<K, V> OrderedMap<K, Vec<V>>
where
    K: Eq + Hash + Clone,
{
    /// Append `value` to the list under `key`, creating the list if needed.
    pub fn push(&mut self, key: K, value: V) {
        self.get_or_insert_with(key, Vec::new).push(value);
    }

    /// Sum of list lengths across all keys.
    pub fn total_len(&self) -> usize {
        self.values().map(Vec::len).sum()
    }
}

// ─── serde ──────────────────────────────────────────────────────────────────

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((k, v)) = access.next_entry()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_follows_first_insertion() {
        let mut map: OrderedMap<String, u32> = OrderedMap::new();
        map.insert("wave".into(), 1);
        map.insert("greet".into(), 2);
        map.insert("flee".into(), 3);
        map.insert("wave".into(), 9);

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["wave", "greet", "flee"]);
        assert_eq!(map.get("wave"), Some(&9));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_multimap_preserves_push_order() {
        let mut groups: OrderedMultiMap<&str, u32> = OrderedMultiMap::new();
        groups.push("b", 1);
        groups.push("a", 2);
        groups.push("b", 3);

        assert_eq!(groups.get("b").map(Vec::as_slice), Some(&[1, 3][..]));
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(groups.total_len(), 3);
    }

    #[test]
    fn test_missing_key_is_none() {
        let map: OrderedMap<String, u32> = OrderedMap::new();
        assert!(map.get("nothing").is_none());
        assert!(map.is_empty());
        assert_eq!(map.position("nothing"), None);
    }

    #[test]
    fn test_json_keeps_document_order() {
        let json = r#"{"zeta":1,"alpha":2,"mid":3}"#;
        let map: OrderedMap<String, u32> = serde_json::from_str(json).unwrap();
        assert_eq!(
            map.keys().map(String::as_str).collect::<Vec<_>>(),
            ["zeta", "alpha", "mid"]
        );
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }
}
