//! # Binding Configuration
//!
//! Option structs for the two translation directions. Each derives
//! `Deserialize` with field-level defaults, so an application can keep its
//! binding policy in the same YAML or JSON document as the rest of its
//! settings and only spell out what differs from the defaults:
//!
//! ```yaml
//! unflatten:
//!   strict: true
//! flatten:
//!   include_empty: true
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BindError;

/// Options for populating an instance tree from a flat mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FromFlatOptions {
    /// Run each node's converter after assigning its raw value.
    pub convert: bool,
    /// Propagate converter failures instead of recording them on the node.
    pub strict: bool,
}

impl Default for FromFlatOptions {
    fn default() -> Self {
        Self {
            convert: true,
            strict: false,
        }
    }
}

impl FromFlatOptions {
    /// Default options with strict conversion.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Assign raw values only, leaving typed values untouched.
    pub fn raw_only() -> Self {
        Self {
            convert: false,
            ..Self::default()
        }
    }
}

/// Options for serializing an instance tree into a flat mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenOptions {
    /// Run each node's adapter and emit the adapted raw value.
    pub adapt: bool,
    /// Emit every node, writing `null` where no value is set.
    pub include_empty: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            adapt: true,
            include_empty: false,
        }
    }
}

/// Binding policy for both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindConfig {
    /// Options for `from_flat`.
    pub unflatten: FromFlatOptions,
    /// Options for `flatten`.
    pub flatten: FlattenOptions,
}

impl BindConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Config` if the document is not valid YAML or has
    /// unknown keys.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, BindError> {
        serde_yaml::from_str(yaml).map_err(|e| BindError::Config(format!("invalid YAML: {e}")))
    }

    /// Interpret an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Config` if the value does not describe a config.
    pub fn from_json_value(value: Value) -> Result<Self, BindError> {
        serde_json::from_value(value).map_err(|e| BindError::Config(format!("invalid JSON: {e}")))
    }
}
