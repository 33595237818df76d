//! # Validation Engine
//!
//! Runs validator chains depth-first and post-order: every child is
//! validated before its parent, and a failing child never stops its
//! siblings from being validated. Within one node the validators run in
//! order until one rejects or fails.
//!
//! Validation never returns an error. Outcomes are reported through the
//! boolean result and through each node's `validation_errors`, which are
//! reset at the start of every pass. [`Form::report`] gathers everything
//! captured below a node into a single [`Report`].

use std::fmt;

use fieldtree_core::FieldError;

use crate::form::{Form, NodeId};

impl Form {
    /// Validate the whole form.
    pub fn is_valid(&mut self) -> bool {
        let root = self.root();
        self.is_valid_node(root, true)
    }

    /// Validate one node, and with `recursive` everything below it.
    ///
    /// Returns `true` when all validated children are valid and every
    /// validator of the node itself passed.
    pub fn is_valid_node(&mut self, id: NodeId, recursive: bool) -> bool {
        self.clear_validation_errors(id);

        let mut valid = true;
        if recursive {
            for child in self.walk_children(id) {
                valid &= self.is_valid_node(child, true);
            }
        }

        let validators = self.schema(id).validators().to_vec();
        for validator in validators {
            let outcome = validator.call(&mut self.node_mut(id));
            match outcome {
                Ok(true) => continue,
                Ok(false) => {
                    tracing::debug!(path = %self.path(id), "validator rejected node");
                    valid = false;
                    break;
                }
                Err(source) => {
                    let path = self.path(id);
                    tracing::debug!(path = %path, error = %source, "validator failed");
                    self.push_validation_error(id, FieldError::new(path, source));
                    valid = false;
                    break;
                }
            }
        }
        valid
    }

    /// Collect every captured conversion and validation error at or below
    /// `id`, in pre-order with children in schema order then list elements.
    ///
    /// Only nodes that already exist are visited; nothing is materialized.
    pub fn report(&self, id: NodeId) -> Report {
        let mut entries = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(error) = self.conversion_error(node) {
                entries.push(ReportEntry {
                    kind: ErrorKind::Conversion,
                    error: error.clone(),
                });
            }
            entries.extend(self.validation_errors(node).iter().map(|error| ReportEntry {
                kind: ErrorKind::Validation,
                error: error.clone(),
            }));
            let children = self.existing_children(node);
            stack.extend(children.into_iter().rev());
        }
        Report { entries }
    }
}

// ─── Report ──────────────────────────────────────────────────────────

/// Which stage captured an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Recorded by a lenient conversion.
    Conversion,
    /// Recorded during a validation pass.
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion => f.write_str("conversion"),
            Self::Validation => f.write_str("validation"),
        }
    }
}

/// One captured error.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    /// The stage that captured it.
    pub kind: ErrorKind,
    /// The error, carrying the node's path.
    pub error: FieldError,
}

impl ReportEntry {
    /// Path of the node the error was captured on.
    pub fn path(&self) -> &str {
        self.error.path()
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  [{}] {}", self.kind, self.error)
    }
}

/// All errors captured below a node.
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a slice of all entries.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ReportEntry> {
        self.entries
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
