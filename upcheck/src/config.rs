//! Host configuration.

/// Configuration the host supplies at construction.
///
/// The callback URL is passed in explicitly rather than read from any
/// process-wide state; an explicit URL given to the builder, or an
/// override persisted in the store, takes precedence over the default
/// here.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Default callback URL to poll for version information.
    pub callback_url: String,
    /// Name of the query parameter carrying the current version.
    pub version_key: String,
    /// The host application's current version number.
    pub version_number: u64,
}

impl CheckerConfig {
    /// Creates a configuration value.
    pub fn new(
        callback_url: impl Into<String>,
        version_key: impl Into<String>,
        version_number: u64,
    ) -> Self {
        Self {
            callback_url: callback_url.into(),
            version_key: version_key.into(),
            version_number,
        }
    }
}
