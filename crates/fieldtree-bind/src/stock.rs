//! # Stock Hooks
//!
//! Ready-made converters, adapters, and validators for the field types a
//! typical form needs. Converters accept both the string form a browser
//! submits and the native JSON form a parsed config document carries.
//!
//! Value validators other than [`required`] accept a node with no value,
//! so optional fields only need `required` when they are in fact required.

use serde_json::{Number, Value};

use crate::hooks::{Adapter, Converter, Validator};

// ─── Converters ──────────────────────────────────────────────────────

/// Whole numbers, from integer JSON numbers or decimal strings.
pub fn integer() -> Converter {
    Converter::new(|raw| match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(raw.clone()),
        Value::String(s) => {
            let n: i64 = s
                .trim()
                .parse()
                .map_err(|_| format!("'{s}' is not a whole number"))?;
            Ok(Value::from(n))
        }
        other => Err(format!("{other} is not a whole number").into()),
    })
}

/// Floating point numbers, from JSON numbers or decimal strings.
pub fn float() -> Converter {
    Converter::new(|raw| match raw {
        Value::Number(_) => Ok(raw.clone()),
        Value::String(s) => {
            let f: f64 = s
                .trim()
                .parse()
                .map_err(|_| format!("'{s}' is not a number"))?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("'{s}' is not a finite number").into())
        }
        other => Err(format!("{other} is not a number").into()),
    })
}

/// Booleans, from JSON booleans or the usual checkbox spellings.
pub fn boolean() -> Converter {
    Converter::new(|raw| match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
            _ => Err(format!("'{s}' is not a boolean").into()),
        },
        other => Err(format!("{other} is not a boolean").into()),
    })
}

/// Text. Scalars are rendered as strings; arrays and objects are rejected.
pub fn text() -> Converter {
    Converter::new(|raw| match raw {
        Value::String(_) => Ok(raw.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(Value::String(raw.to_string())),
        other => Err(format!("{other} is not text").into()),
    })
}

// ─── Adapters ────────────────────────────────────────────────────────

/// Render a typed value in the string form a flat mapping carries.
///
/// Strings pass through unchanged, `null` becomes the empty string, and
/// everything else uses its JSON rendering.
pub fn display() -> Adapter {
    Adapter::new(|value| {
        Ok(match value {
            Value::String(_) => value.clone(),
            Value::Null => Value::String(String::new()),
            other => Value::String(other.to_string()),
        })
    })
}

// ─── Validators ──────────────────────────────────────────────────────

/// The node must hold a value that is not `null`, an empty string, or an
/// empty array.
pub fn required() -> Validator {
    Validator::check("a value is required", |value| match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    })
}

/// Length bounds, in characters for strings and elements for arrays.
pub fn length(min: Option<usize>, max: Option<usize>) -> Validator {
    let message = match (min, max) {
        (Some(min), Some(max)) => format!("length must be between {min} and {max}"),
        (Some(min), None) => format!("length must be at least {min}"),
        (None, Some(max)) => format!("length must be at most {max}"),
        (None, None) => "length is unbounded".to_string(),
    };
    Validator::check(message, move |value| {
        let len = match value {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(items)) => items.len(),
            _ => return true,
        };
        min.map_or(true, |min| len >= min) && max.map_or(true, |max| len <= max)
    })
}

/// Numeric bounds, inclusive on both ends.
pub fn range(min: Option<f64>, max: Option<f64>) -> Validator {
    let message = match (min, max) {
        (Some(min), Some(max)) => format!("must be between {min} and {max}"),
        (Some(min), None) => format!("must be at least {min}"),
        (None, Some(max)) => format!("must be at most {max}"),
        (None, None) => "must be a number".to_string(),
    };
    Validator::check(message, move |value| match value {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(n) => min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max),
            None => false,
        },
        Some(_) => false,
    })
}

/// The value must equal one of `choices`.
pub fn one_of(choices: Vec<Value>) -> Validator {
    let listed = choices
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Validator::check(format!("must be one of: {listed}"), move |value| match value {
        None => true,
        Some(value) => choices.contains(value),
    })
}

/// A list node must have at least `min` elements.
pub fn min_items(min: usize) -> Validator {
    Validator::new(move |node| {
        let len = node.items().len();
        if len >= min {
            Ok(true)
        } else {
            node.push_error(format!("at least {min} item(s) required, found {len}"));
            Ok(false)
        }
    })
}
