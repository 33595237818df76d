//! # Schema-Level Binding
//!
//! A `Binding` is a schema seen from a particular parent. Resolving a child
//! through a binding yields a new binding whose parent is the one it was
//! resolved from, so a chain of lookups knows its own flat path without
//! any instance being created:
//!
//! ```
//! use fieldtree_bind::SchemaNode;
//!
//! let leaf = SchemaNode::field("Leaf");
//! let inner = SchemaNode::builder("Inner").child("zip", &leaf).build().unwrap();
//! let outer = SchemaNode::builder("Outer").child("address", &inner).build().unwrap();
//!
//! let root = outer.bind();
//! let address = root.resolve("address").unwrap();
//! let zip = address.resolve("zip").unwrap();
//! assert_eq!(zip.path(), "address.zip");
//! ```
//!
//! The parent is a borrow, never an owning pointer: a binding cannot
//! outlive the binding it was resolved from.

use std::sync::Arc;

use fieldtree_core::{join, BindError};

use crate::schema::SchemaNode;

/// A schema annotated with the binding it was resolved from.
#[derive(Debug, Clone)]
pub struct Binding<'p> {
    schema: Arc<SchemaNode>,
    parent: Option<&'p Binding<'p>>,
}

impl SchemaNode {
    /// Bind this schema as the root of a lookup chain.
    pub fn bind(self: &Arc<Self>) -> Binding<'static> {
        Binding {
            schema: Arc::clone(self),
            parent: None,
        }
    }
}

impl<'p> Binding<'p> {
    /// Resolve a child, bound to this binding.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NotFound` if the schema has no such child.
    pub fn resolve(&self, name: &str) -> Result<Binding<'_>, BindError> {
        let child = self.schema.child(name)?;
        Ok(Binding {
            schema: Arc::clone(child),
            parent: Some(self),
        })
    }

    /// The binding this one was resolved from.
    pub fn parent(&self) -> Option<&Binding<'p>> {
        self.parent
    }

    /// Whether this binding has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The bound schema.
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    /// The bound schema's name.
    pub fn name(&self) -> Option<&str> {
        self.schema.name()
    }

    /// Dotted path from the outermost named binding down to this one.
    ///
    /// Collection stops at the first binding without a name, so a nameless
    /// root contributes nothing.
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(binding) = current {
            match binding.name() {
                Some(name) => names.push(name),
                None => break,
            }
            current = binding.parent;
        }
        names
            .iter()
            .rev()
            .fold(String::new(), |path, name| join(&path, name))
    }
}
