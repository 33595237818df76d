//! # Hook Types: Converter, Adapter, Validator
//!
//! The three user-supplied collaborators of a schema node, each a cheap
//! clonable handle around a shared closure:
//!
//! | hook        | called with          | returns                       |
//! |-------------|----------------------|-------------------------------|
//! | `Converter` | the node's raw value | the typed value, or a failure |
//! | `Adapter`   | the node's value     | the raw value, or a failure   |
//! | `Validator` | the node itself      | pass/fail, or a failure       |
//!
//! Hooks are `Send + Sync` so that schemas can be shared freely once built.

use std::fmt;
use std::sync::Arc;

use fieldtree_core::BoxError;
use serde_json::Value;

use crate::form::NodeMut;

type ConvertFn = dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync;
type ValidateFn = dyn Fn(&mut NodeMut<'_>) -> Result<bool, BoxError> + Send + Sync;

/// Raw → typed conversion.
#[derive(Clone)]
pub struct Converter(Arc<ConvertFn>);

impl Converter {
    /// Wrap a conversion function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Convert a raw value.
    pub fn call(&self, raw: &Value) -> Result<Value, BoxError> {
        (self.0)(raw)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(..)")
    }
}

/// Typed → raw adaptation.
#[derive(Clone)]
pub struct Adapter(Arc<ConvertFn>);

impl Adapter {
    /// Wrap an adaptation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Adapt a typed value back to raw form.
    pub fn call(&self, value: &Value) -> Result<Value, BoxError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Adapter(..)")
    }
}

/// A predicate over a node.
///
/// Returning `Ok(false)` marks the node invalid; the validator may record
/// the reason first with [`NodeMut::push_error`]. Returning `Err` marks the
/// node invalid and the engine records the error itself.
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    /// Wrap a validation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut NodeMut<'_>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Build a validator from a predicate over the node's typed value.
    ///
    /// On rejection `message` is recorded on the node.
    pub fn check<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        Self::new(move |node| {
            if predicate(node.value()) {
                Ok(true)
            } else {
                node.push_error(message.clone());
                Ok(false)
            }
        })
    }

    /// Run the validator against `node`.
    pub fn call(&self, node: &mut NodeMut<'_>) -> Result<bool, BoxError> {
        (self.0)(node)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}
