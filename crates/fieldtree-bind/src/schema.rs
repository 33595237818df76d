//! # Schema Nodes: Composition and Override
//!
//! A `SchemaNode` describes one field: its name, its hooks, its children,
//! and (for lists) the schema of its elements. Nodes are immutable once
//! built and shared through `Arc`.
//!
//! ## Composition
//!
//! A node is built from an ordered list of bases plus its own declared
//! children. The merged child set is computed once, at build time:
//!
//! ```text
//! children(C) = declared(C)
//!             ++ [c in children(B1) if c.name not yet present]
//!             ++ [c in children(B2) if c.name not yet present]
//!             ++ ...
//! ```
//!
//! Because every base already carries its own merged set, this is a
//! depth-first search over the base graph in declaration order where the
//! first declaration of a name wins. Hooks and the node's own name resolve
//! the same way: the node's own setting, else the first base that has one.
//!
//! ## Override
//!
//! [`SchemaNode::with_attrs`] produces a new node whose single base is the
//! original. The original is never touched, and any number of overridden
//! views of it can coexist. Declaring a child under a name goes through the
//! same mechanism: the stored child is a renamed view of the schema that
//! was passed in, so [`SchemaNode::derives_from`] still recognizes it.

use std::fmt;
use std::sync::Arc;

use fieldtree_core::{BindError, FieldName};

use crate::hooks::{Adapter, Converter, Validator};

// ─── Schema Node ─────────────────────────────────────────────────────

/// An immutable field descriptor.
pub struct SchemaNode {
    type_name: Arc<str>,
    name: Option<FieldName>,
    converter: Option<Converter>,
    adapter: Option<Adapter>,
    validators: Vec<Validator>,
    element: Option<Arc<SchemaNode>>,
    bases: Vec<Arc<SchemaNode>>,
    declared: Vec<FieldName>,
    children: Vec<(FieldName, Arc<SchemaNode>)>,
}

impl SchemaNode {
    /// Start building a schema with the given type name.
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(type_name)
    }

    /// A plain leaf field with no hooks and no children.
    pub fn field(type_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            type_name: Arc::from(type_name.into()),
            name: None,
            converter: None,
            adapter: None,
            validators: Vec::new(),
            element: None,
            bases: Vec::new(),
            declared: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Start building a list whose elements follow `element`.
    ///
    /// The list takes the element's type name, and its name defaults to the
    /// element's name. The element may not itself be a list; building such a
    /// schema fails.
    pub fn list_of(element: &Arc<SchemaNode>) -> SchemaBuilder {
        let mut builder = SchemaBuilder::new(element.type_name.as_ref());
        builder.name = element.name.as_ref().map(|n| n.to_string());
        builder.element = Some(Arc::clone(element));
        builder
    }

    /// The descriptive type name given at construction.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The field name, if this schema has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(FieldName::as_str)
    }

    /// The converter, if any.
    pub fn converter(&self) -> Option<&Converter> {
        self.converter.as_ref()
    }

    /// The adapter, if any.
    pub fn adapter(&self) -> Option<&Adapter> {
        self.adapter.as_ref()
    }

    /// Validators in the order they run.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// The element schema, if this is a list.
    pub fn element(&self) -> Option<&Arc<SchemaNode>> {
        self.element.as_ref()
    }

    /// Whether this schema describes a list.
    pub fn is_list(&self) -> bool {
        self.element.is_some()
    }

    /// Direct bases, in priority order.
    pub fn bases(&self) -> &[Arc<SchemaNode>] {
        &self.bases
    }

    /// Names declared on this node itself, excluding inherited ones.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(FieldName::as_str)
    }

    /// Every reachable child name, each once, first declaration first.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(name, _)| name.as_str())
    }

    /// Every reachable child with its name, in the same order as
    /// [`child_names`](Self::child_names).
    pub fn children(&self) -> impl Iterator<Item = (&FieldName, &Arc<SchemaNode>)> {
        self.children.iter().map(|(name, child)| (name, child))
    }

    /// Whether `name` resolves to a child.
    pub fn has_child(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Resolve a child by name through the declared children and then the
    /// bases, most-derived first.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if no declaration of `name` is reachable.
    pub fn child(&self, name: &str) -> Result<&Arc<SchemaNode>, BindError> {
        self.lookup(name)
            .map(|(_, child)| child)
            .ok_or_else(|| self.not_found(name))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<(&FieldName, &Arc<SchemaNode>)> {
        self.children
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(name, child)| (name, child))
    }

    pub(crate) fn not_found(&self, name: &str) -> BindError {
        BindError::NotFound {
            schema: self.type_name.to_string(),
            name: name.to_string(),
        }
    }

    /// Whether this schema is `other`, or was built on top of it through
    /// composition, renaming, or overrides.
    pub fn derives_from(&self, other: &Arc<SchemaNode>) -> bool {
        std::ptr::eq(self, Arc::as_ptr(other)) || self.bases.iter().any(|b| b.derives_from(other))
    }

    /// A new schema that behaves like this one with some attributes
    /// replaced. This schema is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `BindError::InvalidArguments` if `overrides` is empty or
    /// carries an invalid name.
    pub fn with_attrs(self: &Arc<Self>, overrides: Overrides) -> Result<Arc<Self>, BindError> {
        if overrides.is_empty() {
            return Err(BindError::InvalidArguments(format!(
                "with_attrs on '{}' needs at least one attribute to override",
                self.type_name
            )));
        }
        let mut node = self.derive();
        if let Some(name) = overrides.name {
            node.name = Some(FieldName::new(name)?);
        }
        if let Some(converter) = overrides.converter {
            node.converter = converter;
        }
        if let Some(adapter) = overrides.adapter {
            node.adapter = adapter;
        }
        if let Some(validators) = overrides.validators {
            node.validators = validators;
        }
        Ok(Arc::new(node))
    }

    /// A view of this schema under another name.
    pub(crate) fn renamed(self: &Arc<Self>, name: FieldName) -> Arc<Self> {
        let mut node = self.derive();
        node.name = Some(name);
        Arc::new(node)
    }

    fn derive(self: &Arc<Self>) -> Self {
        Self {
            type_name: Arc::clone(&self.type_name),
            name: self.name.clone(),
            converter: self.converter.clone(),
            adapter: self.adapter.clone(),
            validators: self.validators.clone(),
            element: self.element.clone(),
            bases: vec![Arc::clone(self)],
            declared: Vec::new(),
            children: self.children.clone(),
        }
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("type_name", &self.type_name)
            .field("name", &self.name())
            .field("children", &self.child_names().collect::<Vec<_>>())
            .field("is_list", &self.is_list())
            .field("validators", &self.validators.len())
            .finish()
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Assembles a [`SchemaNode`] from bases, hooks, and declared children.
///
/// Setters never fail; every name is checked in [`build`](Self::build).
#[derive(Debug)]
pub struct SchemaBuilder {
    type_name: String,
    name: Option<String>,
    converter: Option<Converter>,
    adapter: Option<Adapter>,
    validators: Vec<Validator>,
    element: Option<Arc<SchemaNode>>,
    bases: Vec<Arc<SchemaNode>>,
    declared: Vec<(String, Arc<SchemaNode>)>,
}

impl SchemaBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: None,
            converter: None,
            adapter: None,
            validators: Vec::new(),
            element: None,
            bases: Vec::new(),
            declared: Vec::new(),
        }
    }

    /// Compose with `base`. Earlier bases take priority over later ones.
    pub fn extends(mut self, base: &Arc<SchemaNode>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Give the schema an explicit field name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the converter.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the adapter.
    pub fn adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Append a validator.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Declare a child field. A declared name hides any inherited child of
    /// the same name.
    pub fn child(mut self, name: impl Into<String>, schema: &Arc<SchemaNode>) -> Self {
        self.declared.push((name.into(), Arc::clone(schema)));
        self
    }

    /// Finish the schema.
    ///
    /// # Errors
    ///
    /// Returns `BindError::InvalidArguments` if the schema name or a child
    /// name is not a valid [`FieldName`], a child name is declared twice, or
    /// the list element is itself a list. Element keys are `<list>-<index>`
    /// followed only by `.<field>`, so a directly nested index has no key.
    pub fn build(self) -> Result<Arc<SchemaNode>, BindError> {
        let name = self.name.map(FieldName::new).transpose()?;

        let mut declared = Vec::with_capacity(self.declared.len());
        let mut children: Vec<(FieldName, Arc<SchemaNode>)> = Vec::new();
        for (child_name, schema) in self.declared {
            let child_name = FieldName::new(child_name)?;
            if declared.contains(&child_name) {
                return Err(BindError::InvalidArguments(format!(
                    "field '{child_name}' declared twice on '{}'",
                    self.type_name
                )));
            }
            declared.push(child_name.clone());
            children.push((child_name.clone(), schema.renamed(child_name)));
        }
        for base in &self.bases {
            for (child_name, child) in &base.children {
                if !children.iter().any(|(existing, _)| existing == child_name) {
                    children.push((child_name.clone(), Arc::clone(child)));
                }
            }
        }

        let bases = self.bases;
        let inherited_name = || bases.iter().find_map(|b| b.name.clone());
        let inherited_converter = || bases.iter().find_map(|b| b.converter.clone());
        let inherited_adapter = || bases.iter().find_map(|b| b.adapter.clone());
        let inherited_element = || bases.iter().find_map(|b| b.element.clone());
        let inherited_validators = || {
            bases
                .iter()
                .map(|b| &b.validators)
                .find(|v| !v.is_empty())
                .cloned()
                .unwrap_or_default()
        };

        let element = self.element.or_else(inherited_element);
        if let Some(element) = element.as_ref().filter(|e| e.is_list()) {
            return Err(BindError::InvalidArguments(format!(
                "list '{}' cannot have list elements of type '{}'; wrap the inner list in a named field",
                self.type_name,
                element.type_name()
            )));
        }

        let node = SchemaNode {
            type_name: Arc::from(self.type_name),
            name: name.or_else(inherited_name),
            converter: self.converter.or_else(inherited_converter),
            adapter: self.adapter.or_else(inherited_adapter),
            validators: if self.validators.is_empty() {
                inherited_validators()
            } else {
                self.validators
            },
            element,
            bases: Vec::new(),
            declared,
            children,
        };
        Ok(Arc::new(SchemaNode { bases, ..node }))
    }
}

// ─── Overrides ───────────────────────────────────────────────────────

/// The attribute replacements applied by [`SchemaNode::with_attrs`].
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    name: Option<String>,
    converter: Option<Option<Converter>>,
    adapter: Option<Option<Adapter>>,
    validators: Option<Vec<Validator>>,
}

impl Overrides {
    /// An empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the converter.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(Some(converter));
        self
    }

    /// Remove the converter.
    pub fn without_converter(mut self) -> Self {
        self.converter = Some(None);
        self
    }

    /// Replace the adapter.
    pub fn adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = Some(Some(adapter));
        self
    }

    /// Remove the adapter.
    pub fn without_adapter(mut self) -> Self {
        self.adapter = Some(None);
        self
    }

    /// Replace the whole validator chain.
    pub fn validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators = Some(validators);
        self
    }

    /// Whether nothing would be overridden.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.converter.is_none()
            && self.adapter.is_none()
            && self.validators.is_none()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
