//! # fieldtree-bind: Schema-Driven Field Binding
//!
//! Declares trees of typed fields and translates them to and from flat,
//! string-keyed mappings such as submitted web forms, query strings, or
//! INI-style configuration sections.
//!
//! ## Layers
//!
//! - **Schema** (`schema.rs`): immutable field descriptors with hooks,
//!   multi-base composition (first declaration wins), and non-destructive
//!   attribute overrides.
//!
//! - **Binding** (`binding.rs`): schema-level lookup chains that know
//!   their parent and therefore their dotted path.
//!
//! - **Form** (`form.rs`): the live instance tree, stored in an arena.
//!   Children materialize on first access; lists own their elements in
//!   position order.
//!
//! - **Flatten** (`flatten.rs`): `from_flat` and `flatten`, including the
//!   `<path>-<index>` encoding of list elements.
//!
//! - **Validate** (`validate.rs`): post-order validation with captured
//!   errors, and the per-subtree error [`Report`].
//!
//! - **Stock** (`stock.rs`): converters, adapters, and validators for
//!   common field types.
//!
//! ## Example
//!
//! ```
//! use fieldtree_bind::{stock, Form, SchemaNode};
//! use fieldtree_core::{FlatMap, FlattenOptions, FromFlatOptions};
//! use serde_json::json;
//!
//! let age = SchemaNode::builder("Age")
//!     .converter(stock::integer())
//!     .adapter(stock::display())
//!     .validator(stock::range(Some(0.0), Some(150.0)))
//!     .build()
//!     .unwrap();
//! let person = SchemaNode::builder("Person")
//!     .child("name", &SchemaNode::field("Text"))
//!     .child("age", &age)
//!     .build()
//!     .unwrap();
//!
//! let flat: FlatMap = [("name", json!("Ada")), ("age", json!("36"))].into_iter().collect();
//! let mut form = Form::from_flat(&person, &flat, FromFlatOptions::default()).unwrap();
//! assert!(form.is_valid());
//!
//! let root = form.root();
//! let age = form.child(root, "age").unwrap();
//! assert_eq!(form.value(age), Some(&json!(36)));
//! assert_eq!(form.flatten(FlattenOptions::default()).unwrap(), flat);
//! ```
//!
//! ## Crate Policy
//!
//! - Logging goes through `tracing`; the crate never installs a subscriber.
//! - No `unsafe` code.

pub mod binding;
pub mod flatten;
pub mod form;
pub mod hooks;
pub mod schema;
pub mod stock;
pub mod validate;

pub use binding::Binding;
pub use form::{Form, NodeId, NodeMut};
pub use hooks::{Adapter, Converter, Validator};
pub use schema::{Overrides, SchemaBuilder, SchemaNode};
pub use validate::{ErrorKind, Report, ReportEntry};
