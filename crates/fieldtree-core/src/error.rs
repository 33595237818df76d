//! # Error Types
//!
//! Defines the error types used throughout fieldtree. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! Three failure channels exist, and they never mix:
//!
//! - **Propagated errors** ([`BindError`]): schema resolution failures,
//!   adapter failures, strict-mode conversion failures, and misuse of the
//!   builders. These are returned to the caller through `Result`.
//! - **Captured errors** ([`FieldError`]): lenient conversion failures and
//!   validator failures. These are stored on the instance node they belong
//!   to and inspected later; they are never re-raised.
//! - **Validation outcome**: not an error at all. `is_valid()` returns a
//!   boolean and the per-node `validation_errors` carry the detail.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Failure type returned by user-supplied converters, adapters, and validators.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error type for fieldtree.
#[derive(Error, Debug)]
pub enum BindError {
    /// A child name is not declared on the schema or any of its bases.
    #[error("field '{name}' is not declared on schema '{schema}'")]
    NotFound {
        /// Type name of the schema that was searched.
        schema: String,
        /// The child name that was requested.
        name: String,
    },

    /// A converter failed and the caller asked for strict conversion.
    #[error("conversion failed at '{path}': {source}")]
    Conversion {
        /// Flat path of the node whose raw value could not be converted.
        path: String,
        /// The converter's failure.
        #[source]
        source: BoxError,
    },

    /// An adapter failed. Adaptation has no lenient mode.
    #[error("adaptation failed at '{path}': {source}")]
    Adaptation {
        /// Flat path of the node whose value could not be adapted.
        path: String,
        /// The adapter's failure.
        #[source]
        source: BoxError,
    },

    /// A builder or override call was used incorrectly.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A list operation was attempted on a node whose schema is not a list.
    #[error("'{path}' is not a list field")]
    NotAList {
        /// Flat path of the offending node.
        path: String,
    },

    /// A list position outside the live element range.
    #[error("index {index} out of range for list '{path}' of length {len}")]
    IndexOutOfRange {
        /// Flat path of the list node.
        path: String,
        /// The requested position.
        index: usize,
        /// The list's current length.
        len: usize,
    },

    /// A configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BindError {
    /// Whether this error came out of a user hook (converter or adapter).
    pub fn is_hook_failure(&self) -> bool {
        matches!(self, Self::Conversion { .. } | Self::Adaptation { .. })
    }
}

/// A hook failure captured on an instance node.
///
/// Holds the flat path of the node at the moment of capture together with
/// the original failure. Cloning shares the underlying error, so captured
/// errors survive form copies unchanged.
#[derive(Debug, Clone)]
pub struct FieldError {
    path: String,
    source: Arc<dyn StdError + Send + Sync>,
}

impl FieldError {
    /// Capture `source` as belonging to the node at `path`.
    pub fn new(path: impl Into<String>, source: BoxError) -> Self {
        Self {
            path: path.into(),
            source: Arc::from(source),
        }
    }

    /// Capture a plain message as belonging to the node at `path`.
    pub fn message(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, BoxError::from(message.into()))
    }

    /// Flat path of the node the error was captured on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The captured failure.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.source
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.source)
        } else {
            write!(f, "{}: {}", self.path, self.source)
        }
    }
}

impl StdError for FieldError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display_with_path() {
        let err = FieldError::message("address.zip", "not a number");
        assert_eq!(err.to_string(), "address.zip: not a number");
        assert_eq!(err.path(), "address.zip");
    }

    #[test]
    fn test_field_error_display_root() {
        let err = FieldError::message("", "required");
        assert_eq!(err.to_string(), "(root): required");
    }

    #[test]
    fn test_field_error_clone_keeps_source() {
        let err = FieldError::message("a", "boom");
        let copy = err.clone();
        assert_eq!(copy.error().to_string(), "boom");
        assert_eq!(copy.to_string(), err.to_string());
    }

    #[test]
    fn test_conversion_error_exposes_source() {
        let err = BindError::Conversion {
            path: "age".to_string(),
            source: "invalid digit found in string".into(),
        };
        assert!(err.is_hook_failure());
        assert!(err.to_string().contains("age"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn test_not_found_message() {
        let err = BindError::NotFound {
            schema: "Person".to_string(),
            name: "email".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "field 'email' is not declared on schema 'Person'"
        );
        assert!(!err.is_hook_failure());
    }
}
