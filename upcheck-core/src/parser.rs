//! Response parsing.
//!
//! The wire payload is decoded by a host-replaceable [`ResponseParser`].
//! [`JsonResponseParser`] is the default implementation shipped with the
//! library; hosts with a different wire encoding supply their own.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::VersionFields;

// ============================================================================
// Wire Keys
// ============================================================================

/// Keys recognized in the wire payload.
pub mod keys {
    /// Required boolean: a newer version exists.
    pub const UPDATE_AVAILABLE: &str = "updateAvailable";
    /// Required boolean: updating is mandatory.
    pub const UPDATE_REQUIRED: &str = "updateRequired";
    /// Optional number: oldest still-supported version.
    pub const MINIMUM_SUPPORTED_VERSION_NUMBER: &str = "minimumSupportedVersionNumber";
    /// Optional timestamp (epoch seconds): when the latest version appeared.
    pub const LATEST_VERSION_AVAILABLE_SINCE: &str = "latestVersionAvailableSince";
    /// Optional string: display key of the latest version.
    pub const LATEST_VERSION_KEY: &str = "latestVersionKey";
    /// Optional number: numeric latest version.
    pub const LATEST_VERSION_NUMBER: &str = "latestVersionNumber";
}

// ============================================================================
// Parser Capability
// ============================================================================

/// Converts a raw response body into a validated field set.
///
/// Implementations report exactly one [`ParseError`] per payload, in the
/// priority order documented on that type; the caller never needs to merge
/// partial failures.
pub trait ResponseParser: Send + Sync {
    /// Parses a complete response body.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, in priority order: malformed
    /// payload, missing required field, type mismatch.
    fn parse(&self, raw: &[u8]) -> Result<VersionFields, ParseError>;
}

// ============================================================================
// Default JSON Parser
// ============================================================================

/// The default parser: a flat JSON object with the keys in [`keys`].
///
/// Unrecognized keys are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    /// Creates a new JSON parser.
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser for JsonResponseParser {
    fn parse(&self, raw: &[u8]) -> Result<VersionFields, ParseError> {
        debug!(len = raw.len(), "Parsing version-check payload");

        let value: Value = serde_json::from_slice(raw).map_err(|e| {
            warn!(error = %e, "Payload is not valid JSON");
            ParseError::MalformedPayload
        })?;
        let object = value.as_object().ok_or(ParseError::MalformedPayload)?;

        // Every required key must be present before any value is typed,
        // so a missing field outranks a mismatched one.
        for key in [keys::UPDATE_AVAILABLE, keys::UPDATE_REQUIRED] {
            if !object.contains_key(key) {
                warn!(key, "Required field missing from payload");
                return Err(ParseError::missing(key));
            }
        }

        Ok(VersionFields {
            update_available: required_bool(object, keys::UPDATE_AVAILABLE)?,
            update_required: required_bool(object, keys::UPDATE_REQUIRED)?,
            minimum_supported_version: optional_version(
                object,
                keys::MINIMUM_SUPPORTED_VERSION_NUMBER,
            )?,
            update_available_since: optional_timestamp(
                object,
                keys::LATEST_VERSION_AVAILABLE_SINCE,
            )?,
            latest_version_key: optional_string(object, keys::LATEST_VERSION_KEY)?,
            latest_version: optional_version(object, keys::LATEST_VERSION_NUMBER)?,
        })
    }
}

fn required_bool(object: &Map<String, Value>, key: &str) -> Result<bool, ParseError> {
    match object.get(key) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ParseError::mismatch(key, "boolean")),
        None => Err(ParseError::missing(key)),
    }
}

fn optional_version(object: &Map<String, Value>, key: &str) -> Result<Option<u64>, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| ParseError::mismatch(key, "unsigned integer")),
    }
}

fn optional_timestamp(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(Some)
            .ok_or_else(|| ParseError::mismatch(key, "unix timestamp")),
    }
}

fn optional_string(
    object: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, ParseError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ParseError::mismatch(key, "string")),
    }
}

// ============================================================================
// Tests
// ============================================================================
