//! # fieldtree-core: Foundational Types for fieldtree
//!
//! This crate is the leaf of the fieldtree workspace. It defines the
//! vocabulary shared by the binding engine and its callers; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Validated field names.** `FieldName` rejects the path separators
//!    `.` and `-` at construction, so every key the engine produces can be
//!    parsed back unambiguously.
//!
//! 2. **One flat representation.** `FlatMap` is the only shape the engine
//!    reads from or writes to. List-element grouping (ordering by numeric
//!    index, re-keying onto element positions) lives next to it.
//!
//! 3. **Propagated vs captured errors.** `BindError` is returned through
//!    `Result`; `FieldError` is stored on instance nodes. The two never mix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fieldtree-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod flat;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use config::{BindConfig, FlattenOptions, FromFlatOptions};
pub use error::{BindError, BoxError, FieldError};
pub use flat::{FlatMap, ListGroup};
pub use path::{item_path, join, split_list_key, FieldName, FIELD_SEPARATOR, INDEX_SEPARATOR};
