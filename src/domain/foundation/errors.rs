//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// A user-correctable input problem for one field.
///
/// Never a system failure: the dialogue stays where it is and the user is
/// prompted again with `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error with a free-form reason.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        Self::new(field, "a value is required")
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(
        field: impl Into<String>,
        min: impl fmt::Display,
        max: impl fmt::Display,
    ) -> Self {
        Self::new(field, format!("must be between {} and {}", min, max))
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(field, reason)
    }
}

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Infrastructure hiccup (connection dropped, pool exhausted); retry with backoff.
    Transient,
    /// Retrying cannot help.
    Permanent,
}

impl ErrorClass {
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorClass::Transient)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::Transient => "TRANSIENT",
            ErrorClass::Permanent => "PERMANENT",
        };
        write!(f, "{}", s)
    }
}

/// Implemented by infrastructure errors so retry loops can tell them apart.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}
