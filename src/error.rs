//! Error types for the payroll engine.
//!
//! Only structural problems surface as errors: a configuration that makes
//! the rate arithmetic undefined, a rule that fails validation, or an
//! employee/attendance record that cannot be interpreted.  Business
//! no-ops (ineligible employee, disabled rule, non-positive rule value)
//! are never errors; they simply contribute nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field name to message, one entry per violated rule constraint.
///
/// Backed by a `BTreeMap` so that the rendering order is stable across
/// runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.  A later message for the same field replaces
    /// the earlier one.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `None` when nothing was recorded, so callers can write
    /// `validate(..).map_or(Ok(()), ..)`.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Errors raised by the payroll engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayrollError {
    /// The calculation configuration cannot be used (e.g. a zero-hour
    /// workday would divide by zero).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A candidate rule violated one or more constraints.
    #[error("invalid rule: {0}")]
    Validation(FieldErrors),

    /// An employee record cannot be paid.
    #[error("invalid employee {id}: {reason}")]
    InvalidEmployee { id: String, reason: String },

    /// An attendance record could not be converted into worked hours.
    #[error("invalid attendance: {0}")]
    InvalidAttendance(String),
}

impl PayrollError {
    /// The per-field messages of a validation failure, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            PayrollError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T, E = PayrollError> = std::result::Result<T, E>;
