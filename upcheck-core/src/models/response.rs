//! Version-check response types.
//!
//! This module contains the two value types that flow out of a check:
//! - [`VersionFields`] - the raw field set a parser extracts from a payload
//! - [`VersionResponse`] - the validated, persistable verdict

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Parsed Field Set
// ============================================================================

/// The field set extracted from a wire payload by a
/// [`ResponseParser`](crate::ResponseParser).
///
/// This is the parser's output contract: required booleans plus whatever
/// optional fields the server chose to include. It carries no invariants of
/// its own; convert it with [`VersionFields::into_response`] to obtain the
/// normalized verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFields {
    /// Whether a newer version exists.
    pub update_available: bool,
    /// Whether updating is mandatory.
    pub update_required: bool,
    /// Oldest version number the server still supports.
    pub minimum_supported_version: Option<u64>,
    /// When the latest version became available.
    pub update_available_since: Option<DateTime<Utc>>,
    /// Display key of the latest version (e.g. "1.4.2").
    pub latest_version_key: Option<String>,
    /// Numeric latest version.
    pub latest_version: Option<u64>,
}

impl VersionFields {
    /// Converts the raw field set into a [`VersionResponse`].
    ///
    /// A mandatory update implies an available one, so `update_available`
    /// is normalized to hold whenever `update_required` does.
    pub fn into_response(self) -> VersionResponse {
        VersionResponse {
            update_available: self.update_available || self.update_required,
            update_required: self.update_required,
            minimum_supported_version: self.minimum_supported_version,
            update_available_since: self.update_available_since,
            latest_version_key: self.latest_version_key,
            latest_version: self.latest_version,
        }
    }
}

// ============================================================================
// Version Response
// ============================================================================

/// The server's verdict from one successful version check.
///
/// Immutable once built: the request runner creates a fresh value after each
/// successful parse and replaces the persisted one wholesale, never merging.
/// Absent optional fields stay absent through a serialization round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Whether a newer version exists.
    pub update_available: bool,

    /// Whether updating is mandatory.
    pub update_required: bool,

    /// Oldest version number the server still supports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_supported_version: Option<u64>,

    /// When the latest version became available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_available_since: Option<DateTime<Utc>>,

    /// Display key of the latest version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version_key: Option<String>,

    /// Numeric latest version, for the host to compare against its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<u64>,
}

impl VersionResponse {
    /// Validates the response invariants.
    ///
    /// Checks that a mandatory update is also marked available, and that the
    /// minimum supported version does not exceed the latest one when both
    /// are present.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` describing the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.update_required && !self.update_available {
            return Err(CoreError::InvalidData(
                "update marked required but not available".to_string(),
            ));
        }
        if let (Some(minimum), Some(latest)) =
            (self.minimum_supported_version, self.latest_version)
        {
            if minimum > latest {
                return Err(CoreError::InvalidData(format!(
                    "minimum supported version {minimum} exceeds latest version {latest}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
