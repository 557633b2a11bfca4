//! Core error types for upcheck.

use thiserror::Error;

/// Core error type for upcheck operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid data in a response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error produced by a [`ResponseParser`](crate::ResponseParser).
///
/// A parser reports exactly one error per payload, the first one it
/// encounters in this priority order: malformed payload, then missing
/// required field, then type mismatch. Errors are never aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload does not decode as a structured object.
    #[error("payload is not a structured object")]
    MalformedPayload,

    /// A required key is absent from the payload.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// A present key holds a value of the wrong type.
    #[error("field {key} has the wrong type, expected {expected}")]
    TypeMismatch {
        /// The offending key.
        key: String,
        /// Description of the expected type.
        expected: &'static str,
    },
}

impl ParseError {
    /// Creates a `MissingRequiredField` error for the given key.
    pub fn missing(key: &str) -> Self {
        ParseError::MissingRequiredField(key.to_string())
    }

    /// Creates a `TypeMismatch` error for the given key.
    pub fn mismatch(key: &str, expected: &'static str) -> Self {
        ParseError::TypeMismatch {
            key: key.to_string(),
            expected,
        }
    }
}
