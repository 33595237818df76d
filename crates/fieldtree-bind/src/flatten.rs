//! # Flatten / Unflatten
//!
//! Translates between a [`Form`] and a [`FlatMap`].
//!
//! ## Unflatten
//!
//! [`Form::from_flat`] creates a root instance and visits every declared
//! node, parent before children. A node whose path is a key of the mapping
//! takes that value as its raw value and, unless disabled, converts it. A
//! node whose path is absent is left untouched.
//!
//! A list additionally collects the keys `<path>-<digits>` and
//! `<path>-<digits>.<rest>`, groups them by numeric index, and builds one
//! element per group in ascending index order. Each group is re-keyed onto
//! the position its element actually occupies, so sparse or unordered
//! input indices come out dense:
//!
//! ```text
//! { "list-0": 10, "list-2": 11, "list-1": 12 }  ->  [10, 12, 11]
//! { "list-5": "a", "list-9": "b" }              ->  ["a", "b"]
//! ```
//!
//! ## Flatten
//!
//! [`Form::flatten`] emits `path -> raw value` for every node that has a
//! typed value, running the node's adapter first. With `include_empty`
//! every declared node is emitted, absent values as `null`.

use std::sync::Arc;

use fieldtree_core::{item_path, BindError, FlatMap, FlattenOptions, FromFlatOptions};
use serde_json::Value;

use crate::form::{Form, NodeId};
use crate::schema::SchemaNode;

impl Form {
    /// Build a form for `schema` populated from `flat`.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Conversion` if `options.strict` is set and a
    /// converter fails. In lenient mode failures are recorded on the nodes
    /// and the form is returned.
    pub fn from_flat(
        schema: &Arc<SchemaNode>,
        flat: &FlatMap,
        options: FromFlatOptions,
    ) -> Result<Self, BindError> {
        let mut form = Self::new(schema);
        let root = form.root();
        let path = form.path(root);
        form.load(root, &path, flat, options)?;
        tracing::debug!(
            keys = flat.len(),
            nodes = form.node_count(),
            "populated form from flat mapping"
        );
        Ok(form)
    }

    /// Populate the subtree at `id`, whose live path is `path`.
    fn load(
        &mut self,
        id: NodeId,
        path: &str,
        flat: &FlatMap,
        options: FromFlatOptions,
    ) -> Result<(), BindError> {
        if let Some(raw) = flat.get(path) {
            self.set_raw_value(id, Some(raw.clone()));
            if options.convert {
                self.convert_at(id, options.strict, path)?;
            }
        }

        for child in self.materialize_children(id) {
            let child_path = self.field_path(path, child);
            self.load(child, &child_path, flat, options)?;
        }

        if self.schema(id).is_list() {
            for group in flat.list_groups(path) {
                let position = self.items(id).len();
                let item = self.push_item(id)?;
                let element_path = item_path(path, position);
                tracing::trace!(list = %path, index = group.index, element = %element_path, "decoded list element");
                self.load(item, &element_path, &group.rekey(&element_path), options)?;
            }
        }
        Ok(())
    }

    /// Serialize the whole form.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Adaptation` if an adapter fails.
    pub fn flatten(&mut self, options: FlattenOptions) -> Result<FlatMap, BindError> {
        let root = self.root();
        self.flatten_node(root, options)
    }

    /// Serialize the subtree rooted at `id`, with keys as full paths.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Adaptation` if an adapter fails.
    pub fn flatten_node(&mut self, id: NodeId, options: FlattenOptions) -> Result<FlatMap, BindError> {
        let path = self.path(id);
        let mut flat = FlatMap::new();
        self.emit(id, &path, options, &mut flat)?;
        tracing::debug!(path = %path, keys = flat.len(), "flattened form");
        Ok(flat)
    }

    fn emit(
        &mut self,
        id: NodeId,
        path: &str,
        options: FlattenOptions,
        flat: &mut FlatMap,
    ) -> Result<(), BindError> {
        if self.value(id).is_some() || options.include_empty {
            let out = if options.adapt {
                self.adapt(id)?;
                self.raw_value(id)
            } else {
                self.value(id)
            };
            let out = out.cloned().unwrap_or(Value::Null);
            flat.insert(path, out);
        }

        // Unmaterialized children hold nothing, so they are only created
        // when every declared path must appear.
        let fields = if options.include_empty {
            self.materialize_children(id)
        } else {
            self.existing_fields(id)
        };
        for child in fields {
            let child_path = self.field_path(path, child);
            self.emit(child, &child_path, options, flat)?;
        }
        for (position, item) in self.items(id).to_vec().into_iter().enumerate() {
            self.emit(item, &item_path(path, position), options, flat)?;
        }
        Ok(())
    }
}
