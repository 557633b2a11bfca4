//! Poll URL construction.

use url::Url;

use crate::error::CheckError;

/// Builds the poll request's target address from a base address, a
/// version-parameter name, and the current version number.
///
/// The output is deterministic: `{base}?{version_key}={version_number}`
/// with the query pair percent-escaped.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
    version_key: String,
    version_number: u64,
}

impl UrlBuilder {
    /// Creates a builder for the given base address and version parameter.
    pub fn new(
        base: impl Into<String>,
        version_key: impl Into<String>,
        version_number: u64,
    ) -> Self {
        Self {
            base: base.into(),
            version_key: version_key.into(),
            version_number,
        }
    }

    /// Composes the poll URL.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Configuration` when the base address cannot be
    /// parsed. Callers must treat this as fatal for the attempt, not as a
    /// retryable transport failure.
    pub fn url(&self) -> Result<Url, CheckError> {
        let mut url = Url::parse(&self.base).map_err(|e| {
            CheckError::Configuration(format!("invalid callback URL {:?}: {e}", self.base))
        })?;

        url.query_pairs_mut()
            .append_pair(&self.version_key, &self.version_number.to_string());

        Ok(url)
    }
}
