//! Error types shared across the pipeline.
//!
//! [`JsError`] carries parse-time failures with their source location.
//! [`FailureKind`] is the user-facing taxonomy every component error maps onto.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SourcePosition;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntax error in JavaScript code
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undefined variable
    ReferenceError,
    /// Value out of allowed range
    RangeError,
    /// Internal engine error
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::InternalError => "InternalError",
        };
        f.write_str(name)
    }
}

/// A JavaScript error with message and source position.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind, SourcePosition};
///
/// let error = JsError::syntax(
///     "Unexpected token `)`",
///     Some(SourcePosition { line: 3, column: 14, offset: 40 }),
/// );
///
/// assert_eq!(error.kind, ErrorKind::SyntaxError);
/// assert_eq!(error.to_string(), "SyntaxError: Unexpected token `)` (3:14)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Create a syntax error at an optional source position
    pub fn syntax(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        JsError {
            kind: ErrorKind::SyntaxError,
            message: message.into(),
            source_position: position,
        }
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(pos) = &self.source_position {
            write!(f, " ({}:{})", pos.line, pos.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for JsError {}

/// User-facing failure taxonomy.
///
/// Every component error can be classified into one of these so that a run's
/// error panel and the CLI exit status agree on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Source failed to parse or could not be resolved
    InvalidCode,
    /// No recognizable `run` export
    MissingExport,
    /// A transitive import could not be fetched
    BundleFetchError,
    /// The compiled task threw during warmup or measurement
    ExecutionError,
    /// User- or superseding-run-initiated termination
    Cancelled,
}

impl FailureKind {
    /// The stable upper-snake name of this failure kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidCode => "INVALID_CODE",
            FailureKind::MissingExport => "MISSING_EXPORT",
            FailureKind::BundleFetchError => "BUNDLE_FETCH_ERROR",
            FailureKind::ExecutionError => "EXECUTION_ERROR",
            FailureKind::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_error_display_without_position() {
        let error = JsError {
            kind: ErrorKind::TypeError,
            message: "x is not a function".to_string(),
            source_position: None,
        };
        assert_eq!(error.to_string(), "TypeError: x is not a function");
    }

    #[test]
    fn test_failure_kind_serializes_upper_snake() {
        let json = serde_json::to_string(&FailureKind::BundleFetchError).unwrap();
        assert_eq!(json, "\"BUNDLE_FETCH_ERROR\"");
        assert_eq!(FailureKind::MissingExport.to_string(), "MISSING_EXPORT");
    }
}
