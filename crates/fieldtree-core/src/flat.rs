//! # Flat Mappings
//!
//! `FlatMap` is the external representation of an instance tree: flat path
//! keys (see [`crate::path`]) mapped to raw values. Raw values are
//! `serde_json::Value`s so that strings from a web form and numbers or
//! booleans from a parsed config document travel through the same type.
//!
//! Keys are held in a `BTreeMap`, so iteration and serialization are
//! deterministic. Nothing in the binding algorithms depends on key order:
//! list elements are ordered by their numeric index, which is what
//! [`FlatMap::list_groups`] is for.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BindError;
use crate::path::{join, split_list_key, INDEX_SEPARATOR};

/// A flat, string-keyed mapping of paths to raw values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatMap(BTreeMap<String, Value>);

impl FlatMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Config` if `value` is not a JSON object.
    pub fn from_json_object(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(BindError::Config(format!(
                "flat mapping must be a JSON object, got {other}"
            ))),
        }
    }

    /// Look up the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove and return the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Iterate over keys in key order.
    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Convert into a JSON object value.
    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }

    /// Every key addressed to an element of the list at `list_path`, as
    /// `(index, sub_key, value)` triples in key order.
    ///
    /// `sub_key` is the part after the element index (`None` for the
    /// element's own value). Keys with a non-numeric index are skipped.
    pub fn list_entries<'a>(
        &'a self,
        list_path: &'a str,
    ) -> impl Iterator<Item = (u64, Option<&'a str>, &'a Value)> + 'a {
        // Element keys share the `<list>-` prefix, so they form one
        // contiguous run in key order.
        let prefix = format!("{list_path}{INDEX_SEPARATOR}");
        self.0
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .filter_map(move |(key, value)| {
                split_list_key(list_path, key).map(|(index, sub_key)| (index, sub_key, value))
            })
    }

    /// Group the keys of the list at `list_path` by element index.
    ///
    /// Groups come back in ascending numeric index order, so `list-2`
    /// precedes `list-10` regardless of how keys sort as strings. Indices
    /// need not start at zero or be contiguous.
    pub fn list_groups(&self, list_path: &str) -> Vec<ListGroup> {
        let mut groups: BTreeMap<u64, ListGroup> = BTreeMap::new();
        for (index, sub_key, value) in self.list_entries(list_path) {
            groups
                .entry(index)
                .or_insert_with(|| ListGroup {
                    index,
                    entries: Vec::new(),
                })
                .entries
                .push((sub_key.map(str::to_string), value.clone()));
        }
        groups.into_values().collect()
    }
}

impl FromIterator<(String, Value)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, Value)> for FlatMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl Extend<(String, Value)> for FlatMap {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for FlatMap {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlatMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for FlatMap {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// The keys of one list element, gathered by [`FlatMap::list_groups`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListGroup {
    /// The element index as written in the flat keys.
    pub index: u64,
    /// `(sub_key, value)` pairs; `None` is the element's own value.
    pub entries: Vec<(Option<String>, Value)>,
}

impl ListGroup {
    /// Re-key this group onto `element_path`, producing the flat mapping
    /// the element would be populated from at that position.
    ///
    /// When two entries land on the same key (`list-1` and `list-01`) the
    /// first one seen wins and the rest are ignored.
    pub fn rekey(&self, element_path: &str) -> FlatMap {
        let mut flat = FlatMap::new();
        for (sub_key, value) in &self.entries {
            let key = match sub_key {
                Some(sub_key) => join(element_path, sub_key),
                None => element_path.to_string(),
            };
            if !flat.contains_key(&key) {
                flat.insert(key, value.clone());
            }
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> FlatMap {
        FlatMap::from_json_object(value).unwrap()
    }

    #[test]
    fn test_list_entries_skip_own_value_and_foreign_keys() {
        let m = flat(json!({
            "list": 3,
            "list-0": 0,
            "list-1": 1,
            "list-x": 9,
            "other-0": 9,
        }));
        let entries: Vec<_> = m.list_entries("list").collect();
        assert_eq!(
            entries,
            vec![(0, None, &json!(0)), (1, None, &json!(1))]
        );
    }

    #[test]
    fn test_list_groups_ordered_numerically() {
        let m = flat(json!({"list-0": 10, "list-2": 11, "list-1": 12, "list-10": 13}));
        let indices: Vec<u64> = m.list_groups("list").iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 10]);
    }

    #[test]
    fn test_list_groups_collect_structure() {
        let m = flat(json!({
            "list-0.a": 0,
            "list-0.b": 1,
            "list-1.a": 2,
            "list-1.b": 3,
        }));
        let rekeyed: Vec<FlatMap> = m
            .list_groups("list")
            .iter()
            .map(|g| g.rekey("list"))
            .collect();
        assert_eq!(
            rekeyed,
            vec![
                flat(json!({"list.a": 0, "list.b": 1})),
                flat(json!({"list.a": 2, "list.b": 3})),
            ]
        );
    }

    #[test]
    fn test_rekey_onto_position() {
        let m = flat(json!({"a-12": 1, "a-12.b": 2, "a-12.b.c": 3}));
        let groups = m.list_groups("a");
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].rekey("a-0"),
            flat(json!({"a-0": 1, "a-0.b": 2, "a-0.b.c": 3}))
        );
    }

    #[test]
    fn test_rekey_duplicate_index_spellings_first_wins() {
        let m = flat(json!({"list-01": "first", "list-1": "second"}));
        let groups = m.list_groups("list");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rekey("list-0"), flat(json!({"list-0": "first"})));
    }

    #[test]
    fn test_from_json_object_rejects_non_objects() {
        assert!(matches!(
            FlatMap::from_json_object(json!([1, 2])),
            Err(BindError::Config(_))
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let m = flat(json!({"a": "1", "b.c": true}));
        let text = serde_json::to_string(&m).unwrap();
        assert_eq!(text, r#"{"a":"1","b.c":true}"#);
        let back: FlatMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back, m);
    }
}
