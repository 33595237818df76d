//! # Forms: Instance Trees
//!
//! A `Form` holds the live instance tree of one schema. Nodes live in an
//! arena owned by the form and are addressed by [`NodeId`] handles. A node
//! records its parent as a handle, never as an owning pointer, so the
//! parent/child relation carries no reference cycle.
//!
//! ## Node State
//!
//! | field               | meaning                                           |
//! |---------------------|---------------------------------------------------|
//! | `raw_value`         | untyped value as read from a flat mapping         |
//! | `value`             | typed value produced by the converter             |
//! | `conversion_error`  | captured converter failure (lenient mode)         |
//! | `validation_errors` | captured validator output, reset on each pass     |
//!
//! `None` in `raw_value` means "nothing was supplied"; a failed conversion
//! is visible through `conversion_error`, independently of validation.
//!
//! ## Lazy Children
//!
//! Children are created on first access through [`Form::child`] and cached
//! under their name, so repeated access returns the same handle. List
//! elements are owned by their list node in position order; an element's
//! index is always its current position and is never stored.
//!
//! ## Panics
//!
//! Handles are plain indices. Passing a handle obtained from a different
//! form is a programming error and panics on out-of-range access.

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldtree_core::{item_path, join, BindError, BoxError, FieldError, FieldName};
use serde_json::Value;

use crate::schema::SchemaNode;

/// Handle to a node inside a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// How a node hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// No parent: the form root, a copied subtree, or a removed element.
    Detached,
    /// A named child of its parent.
    Field,
    /// A list element of its parent.
    Item,
}

#[derive(Debug, Clone)]
struct Node {
    schema: Arc<SchemaNode>,
    name: Option<FieldName>,
    parent: Option<NodeId>,
    slot: Slot,
    raw_value: Option<Value>,
    value: Option<Value>,
    conversion_error: Option<FieldError>,
    validation_errors: Vec<FieldError>,
    children: BTreeMap<FieldName, NodeId>,
    items: Vec<NodeId>,
}

impl Node {
    fn new(schema: Arc<SchemaNode>, parent: Option<NodeId>, slot: Slot) -> Self {
        Self {
            schema,
            name: None,
            parent,
            slot,
            raw_value: None,
            value: None,
            conversion_error: None,
            validation_errors: Vec::new(),
            children: BTreeMap::new(),
            items: Vec::new(),
        }
    }
}

/// One path segment, collected leaf to root.
enum Segment<'a> {
    Name(&'a str),
    Index(usize),
}

// ─── Form ────────────────────────────────────────────────────────────

/// A live instance tree conforming to a schema.
///
/// `Clone` produces a fully independent copy of the whole tree, which is
/// how a form is handed to another thread.
#[derive(Debug, Clone)]
pub struct Form {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Form {
    /// Create an empty form for `schema`.
    pub fn new(schema: &Arc<SchemaNode>) -> Self {
        Self {
            nodes: vec![Node::new(Arc::clone(schema), None, Slot::Detached)],
            root: NodeId(0),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes allocated in the arena.
    ///
    /// Slots are never reused, so this includes nodes that are no longer
    /// reachable from the root: removed list elements and children that
    /// were replaced by [`assign`](Self::assign). Those are released when
    /// the form is dropped; [`copy`](Self::copy) of the root yields a
    /// compacted form holding only reachable nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_state_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The schema a node conforms to.
    pub fn schema(&self, id: NodeId) -> &Arc<SchemaNode> {
        &self.node(id).schema
    }

    /// The node's parent, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node's name: its own if one was set, else its schema's.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id);
        node.name
            .as_ref()
            .map(FieldName::as_str)
            .or_else(|| node.schema.name())
    }

    /// Give this node its own name, shadowing the schema's.
    ///
    /// # Errors
    ///
    /// Returns `BindError::InvalidArguments` if `name` is not a valid field name.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), BindError> {
        self.node_state_mut(id).name = Some(FieldName::new(name)?);
        Ok(())
    }

    /// The untyped value.
    pub fn raw_value(&self, id: NodeId) -> Option<&Value> {
        self.node(id).raw_value.as_ref()
    }

    /// Replace the untyped value.
    pub fn set_raw_value(&mut self, id: NodeId, raw: Option<Value>) {
        self.node_state_mut(id).raw_value = raw;
    }

    /// The typed value.
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.node(id).value.as_ref()
    }

    /// Replace the typed value.
    pub fn set_value(&mut self, id: NodeId, value: Option<Value>) {
        self.node_state_mut(id).value = value;
    }

    /// The failure captured by the last lenient conversion, if it failed.
    pub fn conversion_error(&self, id: NodeId) -> Option<&FieldError> {
        self.node(id).conversion_error.as_ref()
    }

    /// Errors captured by the last validation pass over this node.
    pub fn validation_errors(&self, id: NodeId) -> &[FieldError] {
        &self.node(id).validation_errors
    }

    pub(crate) fn clear_validation_errors(&mut self, id: NodeId) {
        self.node_state_mut(id).validation_errors.clear();
    }

    pub(crate) fn push_validation_error(&mut self, id: NodeId, error: FieldError) {
        self.node_state_mut(id).validation_errors.push(error);
    }

    /// A mutable view of one node, as handed to validators.
    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut { form: self, id }
    }

    // ── Paths ────────────────────────────────────────────────────────

    /// Flat key of a node.
    ///
    /// Walks up through the parents collecting names and list positions,
    /// stopping at the first node without a name. Named children join with
    /// `.`, list elements with `-<position>`.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            match (node.slot, node.parent) {
                (Slot::Item, Some(parent)) => match self.position(parent, node_id) {
                    Some(index) => segments.push(Segment::Index(index)),
                    None => break,
                },
                _ => match self.name(node_id) {
                    Some(name) => segments.push(Segment::Name(name)),
                    None => break,
                },
            }
            current = node.parent;
        }
        segments
            .iter()
            .rev()
            .fold(String::new(), |path, segment| match segment {
                Segment::Name(name) => join(&path, name),
                Segment::Index(index) => item_path(&path, *index),
            })
    }

    fn position(&self, list: NodeId, item: NodeId) -> Option<usize> {
        self.node(list).items.iter().position(|&candidate| candidate == item)
    }

    // ── Children ─────────────────────────────────────────────────────

    /// Get or create the child `name` of a node.
    ///
    /// The first access resolves the child schema and caches a new node
    /// under the name; later accesses return the cached handle.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if the node's schema has no such child.
    pub fn child(&mut self, id: NodeId, name: &str) -> Result<NodeId, BindError> {
        if let Some(&cached) = self.node(id).children.get(name) {
            return Ok(cached);
        }
        let schema = Arc::clone(self.schema(id));
        let (name, child) = schema.lookup(name).ok_or_else(|| schema.not_found(name))?;
        Ok(self.attach(id, name.clone(), Arc::clone(child)))
    }

    /// The child `name` if it has already been materialized.
    pub fn cached_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id).children.get(name).copied()
    }

    fn attach(&mut self, parent: NodeId, name: FieldName, schema: Arc<SchemaNode>) -> NodeId {
        let child = self.alloc(Node::new(schema, Some(parent), Slot::Field));
        self.node_state_mut(parent).children.insert(name, child);
        child
    }

    /// Materialize every declared child of a node, in schema order.
    pub fn materialize_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let schema = Arc::clone(self.schema(id));
        schema
            .children()
            .map(|(name, child)| match self.cached_child(id, name.as_str()) {
                Some(cached) => cached,
                None => self.attach(id, name.clone(), Arc::clone(child)),
            })
            .collect()
    }

    /// Materialized children in schema order, followed by list elements.
    pub(crate) fn walk_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.materialize_children(id);
        children.extend_from_slice(&self.node(id).items);
        children
    }

    /// Already materialized named children in schema order. Creates nothing.
    pub(crate) fn existing_fields(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        node.schema
            .child_names()
            .filter_map(|name| node.children.get(name).copied())
            .collect()
    }

    /// Already materialized children in schema order, followed by list
    /// elements. Creates nothing.
    pub(crate) fn existing_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.existing_fields(id);
        children.extend_from_slice(&self.node(id).items);
        children
    }

    /// Path of the named child `child`, given the path of its parent.
    ///
    /// Tree walks carry the parent path down instead of calling
    /// [`path`](Self::path) per node, which rescans list positions.
    pub(crate) fn field_path(&self, parent_path: &str, child: NodeId) -> String {
        match self.name(child) {
            Some(name) => join(parent_path, name),
            None => String::new(),
        }
    }

    /// Attach a duplicate of `source_id` (from `source`) as the child
    /// `name` of `id`, replacing any cached child of that name.
    ///
    /// The duplicate is rebound to its new parent and takes `name` as its
    /// own name. Later changes to `source` do not reach it.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if `name` is not a child of the
    /// node's schema.
    pub fn assign(
        &mut self,
        id: NodeId,
        name: &str,
        source: &Form,
        source_id: NodeId,
    ) -> Result<NodeId, BindError> {
        let schema = Arc::clone(self.schema(id));
        let (name, _) = schema.lookup(name).ok_or_else(|| schema.not_found(name))?;

        let mut grafted = Vec::new();
        let base = self.nodes.len();
        let copy = source.copy_subtree(source_id, &mut grafted, base, Some(id));
        self.nodes.extend(grafted);

        let node = self.node_state_mut(copy);
        node.slot = Slot::Field;
        node.name = Some(name.clone());
        self.node_state_mut(id).children.insert(name.clone(), copy);
        Ok(copy)
    }

    /// Copy a node and everything below it into a new form.
    ///
    /// The copy becomes the new form's root and keeps its name, so paths
    /// inside the copy are relative to it. Every child in the copy is bound
    /// to its copied parent.
    pub fn copy(&self, id: NodeId) -> Form {
        let mut nodes = Vec::new();
        let root = self.copy_subtree(id, &mut nodes, 0, None);
        let name = self.name(id).and_then(|n| FieldName::new(n).ok());
        let root_node = &mut nodes[root.0];
        root_node.slot = Slot::Detached;
        root_node.name = name;
        Form { nodes, root }
    }

    /// Deep-copy `id` into `into`, numbering new nodes from `base`.
    fn copy_subtree(
        &self,
        id: NodeId,
        into: &mut Vec<Node>,
        base: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let node = self.node(id);
        let copy = NodeId(base + into.len());
        into.push(Node {
            parent,
            children: BTreeMap::new(),
            items: Vec::new(),
            ..node.clone()
        });
        for (name, &child) in &node.children {
            let child_copy = self.copy_subtree(child, into, base, Some(copy));
            into[copy.0 - base].children.insert(name.clone(), child_copy);
        }
        for &item in &node.items {
            let item_copy = self.copy_subtree(item, into, base, Some(copy));
            into[copy.0 - base].items.push(item_copy);
        }
        copy
    }

    // ── Lists ────────────────────────────────────────────────────────

    /// Elements of a list node, in position order. Empty for non-lists.
    pub fn items(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).items
    }

    /// Current position of a list element within its list.
    pub fn item_index(&self, id: NodeId) -> Option<usize> {
        let node = self.node(id);
        match (node.slot, node.parent) {
            (Slot::Item, Some(list)) => self.position(list, id),
            _ => None,
        }
    }

    fn element_schema(&self, id: NodeId) -> Result<Arc<SchemaNode>, BindError> {
        self.schema(id)
            .element()
            .cloned()
            .ok_or_else(|| BindError::NotAList { path: self.path(id) })
    }

    /// Append a new, empty element to a list node.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotAList` if the node's schema is not a list.
    pub fn push_item(&mut self, id: NodeId) -> Result<NodeId, BindError> {
        let len = self.items(id).len();
        self.insert_item(id, len)
    }

    /// Insert a new, empty element at `index`, shifting later elements.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotAList` for non-lists and
    /// `BindError::IndexOutOfRange` if `index` is past the end.
    pub fn insert_item(&mut self, id: NodeId, index: usize) -> Result<NodeId, BindError> {
        let element = self.element_schema(id)?;
        let len = self.items(id).len();
        if index > len {
            return Err(BindError::IndexOutOfRange {
                path: self.path(id),
                index,
                len,
            });
        }
        let item = self.alloc(Node::new(element, Some(id), Slot::Item));
        self.node_state_mut(id).items.insert(index, item);
        Ok(item)
    }

    /// Remove the element at `index` and return it as a form of its own.
    ///
    /// Handles to the removed element stay usable but now refer to a
    /// detached node.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotAList` for non-lists and
    /// `BindError::IndexOutOfRange` if there is no element at `index`.
    pub fn remove_item(&mut self, id: NodeId, index: usize) -> Result<Form, BindError> {
        self.element_schema(id)?;
        let len = self.items(id).len();
        if index >= len {
            return Err(BindError::IndexOutOfRange {
                path: self.path(id),
                index,
                len,
            });
        }
        let item = self.node_state_mut(id).items.remove(index);
        let detached = self.node_state_mut(item);
        detached.parent = None;
        detached.slot = Slot::Detached;
        Ok(self.copy(item))
    }

    // ── Conversion & Adaptation ──────────────────────────────────────

    /// Derive the typed value from the raw value.
    ///
    /// Without a converter the raw value is taken as is. With one, success
    /// stores the result; failure clears the value and either propagates
    /// (`strict`) or is recorded as the node's `conversion_error`. A node
    /// with no raw value ends up with no value and no error.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Conversion` if the converter fails and `strict`
    /// is set.
    pub fn convert(&mut self, id: NodeId, strict: bool) -> Result<(), BindError> {
        self.convert_with(id, strict, |form| form.path(id))
    }

    /// [`convert`](Self::convert) for a node whose path the caller already
    /// holds.
    pub(crate) fn convert_at(&mut self, id: NodeId, strict: bool, path: &str) -> Result<(), BindError> {
        self.convert_with(id, strict, |_| path.to_string())
    }

    fn convert_with<P>(&mut self, id: NodeId, strict: bool, path: P) -> Result<(), BindError>
    where
        P: FnOnce(&Self) -> String,
    {
        let node = self.node_state_mut(id);
        node.conversion_error = None;
        let converter = match node.schema.converter() {
            Some(converter) => converter.clone(),
            None => {
                node.value = node.raw_value.clone();
                return Ok(());
            }
        };
        let outcome = match &node.raw_value {
            Some(raw) => converter.call(raw),
            None => {
                node.value = None;
                return Ok(());
            }
        };
        match outcome {
            Ok(value) => {
                node.value = Some(value);
                Ok(())
            }
            Err(source) => {
                node.value = None;
                let path = path(self);
                if strict {
                    return Err(BindError::Conversion { path, source });
                }
                tracing::debug!(path = %path, error = %source, "conversion failed");
                self.node_state_mut(id).conversion_error = Some(FieldError::new(path, source));
                Ok(())
            }
        }
    }

    /// Derive the raw value from the typed value.
    ///
    /// Without an adapter the value is copied as is. A node without a
    /// value ends up without a raw value; the adapter is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Adaptation` if the adapter fails.
    pub fn adapt(&mut self, id: NodeId) -> Result<(), BindError> {
        let node = self.node(id);
        let adapted = match (node.schema.adapter(), &node.value) {
            (None, value) => value.clone(),
            (Some(_), None) => None,
            (Some(adapter), Some(value)) => match adapter.call(value) {
                Ok(raw) => Some(raw),
                Err(source) => {
                    return Err(BindError::Adaptation {
                        path: self.path(id),
                        source,
                    })
                }
            },
        };
        self.node_state_mut(id).raw_value = adapted;
        Ok(())
    }
}

// ─── Node View ───────────────────────────────────────────────────────

/// Mutable access to one node of a form.
///
/// Validators receive this view. It reads the node's own state, reaches
/// children (materializing them as needed), and records errors.
#[derive(Debug)]
pub struct NodeMut<'f> {
    form: &'f mut Form,
    id: NodeId,
}

impl<'f> NodeMut<'f> {
    /// The node's handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The whole form, read-only.
    pub fn form(&self) -> &Form {
        &*self.form
    }

    /// The node's schema.
    pub fn schema(&self) -> &Arc<SchemaNode> {
        self.form.schema(self.id)
    }

    /// The node's flat key.
    pub fn path(&self) -> String {
        self.form.path(self.id)
    }

    /// The untyped value.
    pub fn raw_value(&self) -> Option<&Value> {
        self.form.raw_value(self.id)
    }

    /// The typed value.
    pub fn value(&self) -> Option<&Value> {
        self.form.value(self.id)
    }

    /// Replace the typed value.
    pub fn set_value(&mut self, value: Option<Value>) {
        self.form.set_value(self.id, value);
    }

    /// The failure captured by the last lenient conversion.
    pub fn conversion_error(&self) -> Option<&FieldError> {
        self.form.conversion_error(self.id)
    }

    /// Errors recorded on the node during the current validation pass.
    pub fn validation_errors(&self) -> &[FieldError] {
        self.form.validation_errors(self.id)
    }

    /// List elements, for list nodes.
    pub fn items(&self) -> &[NodeId] {
        self.form.items(self.id)
    }

    /// Get or create a child.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if the schema has no such child.
    pub fn child(&mut self, name: &str) -> Result<NodeId, BindError> {
        self.form.child(self.id, name)
    }

    /// The typed value of a child, materializing the child if needed.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if the schema has no such child.
    pub fn child_value(&mut self, name: &str) -> Result<Option<&Value>, BindError> {
        let child = self.form.child(self.id, name)?;
        Ok(self.form.value(child))
    }

    /// Record a validation error on this node.
    pub fn push_error(&mut self, error: impl Into<BoxError>) {
        let path = self.path();
        self.form
            .push_validation_error(self.id, FieldError::new(path, error.into()));
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
