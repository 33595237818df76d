//! # Field Names and Flat Key Grammar
//!
//! A flat key addresses one node of an instance tree:
//!
//! ```text
//! key      := segment ( '.' segment | '-' digits )*
//! segment  := any non-empty string without '.' or '-'
//! ```
//!
//! `.` descends into a named child, `-<digits>` selects a list element by
//! position. `order.lines-2.sku` is the `sku` field of the third element of
//! the `lines` list inside `order`.
//!
//! There is no escaping mechanism, so [`FieldName`] rejects both separators
//! at construction. Every name that reaches a schema has passed through it.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BindError;

/// Separator between a node's path and a named child.
pub const FIELD_SEPARATOR: char = '.';

/// Separator between a list's path and an element index.
pub const INDEX_SEPARATOR: char = '-';

/// A validated field name: non-empty, free of `.` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    /// Validate and wrap a field name.
    ///
    /// # Errors
    ///
    /// Returns `BindError::InvalidArguments` if the name is empty or contains
    /// a path separator.
    pub fn new(name: impl Into<String>) -> Result<Self, BindError> {
        let name = name.into();
        if name.is_empty() {
            return Err(BindError::InvalidArguments(
                "field name must not be empty".to_string(),
            ));
        }
        if name.contains([FIELD_SEPARATOR, INDEX_SEPARATOR]) {
            return Err(BindError::InvalidArguments(format!(
                "field name {name:?} must not contain '{FIELD_SEPARATOR}' or '{INDEX_SEPARATOR}'"
            )));
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldName {
    type Error = BindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FieldName {
    type Error = BindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.0
    }
}

/// Path of a named child under `parent`. An empty parent path (a nameless
/// root) contributes no segment.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{FIELD_SEPARATOR}{name}")
    }
}

/// Path of the element at `index` in the list at `list_path`.
pub fn item_path(list_path: &str, index: usize) -> String {
    format!("{list_path}{INDEX_SEPARATOR}{index}")
}

/// Split a flat key addressed to an element of the list at `list_path`.
///
/// Returns the numeric element index and, when the key reaches into the
/// element, the remaining sub-path after the first `.`. Keys that belong to
/// another node, or whose index part is not all ASCII digits, yield `None`.
///
/// ```
/// use fieldtree_core::path::split_list_key;
///
/// assert_eq!(split_list_key("lines", "lines-3"), Some((3, None)));
/// assert_eq!(split_list_key("lines", "lines-3.sku"), Some((3, Some("sku"))));
/// assert_eq!(split_list_key("lines", "lines-x"), None);
/// assert_eq!(split_list_key("lines", "linesx-3"), None);
/// ```
pub fn split_list_key<'k>(list_path: &str, key: &'k str) -> Option<(u64, Option<&'k str>)> {
    let rest = key.strip_prefix(list_path)?;
    let rest = rest.strip_prefix(INDEX_SEPARATOR)?;
    let (index, sub_key) = match rest.split_once(FIELD_SEPARATOR) {
        Some((index, sub_key)) => (index, Some(sub_key)),
        None => (rest, None),
    };
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overlong indices cannot address a real element.
    let index = index.parse::<u64>().ok()?;
    Some((index, sub_key))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every element path built from a list path splits back to its index.
        #[test]
        fn item_path_splits_to_its_index(
            list in "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}",
            index in 0usize..10_000,
        ) {
            let key = item_path(&list, index);
            prop_assert_eq!(split_list_key(&list, &key), Some((index as u64, None)));
        }

        /// Sub-paths below an element survive the split untouched.
        #[test]
        fn element_sub_paths_are_preserved(
            index in 0usize..1_000,
            sub in "[a-z]{1,6}(\\.[a-z]{1,6}){0,3}",
        ) {
            let key = join(&item_path("items", index), &sub);
            prop_assert_eq!(
                split_list_key("items", &key),
                Some((index as u64, Some(sub.as_str())))
            );
        }

        /// Field names never contain a separator.
        #[test]
        fn field_names_never_contain_separators(raw in ".{0,12}") {
            if let Ok(name) = FieldName::new(raw) {
                prop_assert!(!name.as_str().contains('.'));
                prop_assert!(!name.as_str().contains('-'));
            }
        }
    }
}
