//! Client error types.

use thiserror::Error;
use upcheck_core::ParseError;

// ============================================================================
// Transport Error
// ============================================================================

/// Error raised by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection failed (non-HTTP transports).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("Unexpected status code: {0}")]
    Status(u16),
}

// ============================================================================
// Check Error
// ============================================================================

/// Everything that can go wrong with one version-check attempt.
///
/// Configuration errors are fatal for the attempt and never retried as
/// transport failures; transport and parse errors simply wait for the next
/// scheduler tick or manual check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The callback URL is missing or cannot be parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request never produced a complete body.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The body arrived but could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
