//! Transport capability and the default HTTP implementation.
//!
//! The request runner only depends on the [`Transport`] contract: a single
//! asynchronous GET whose body arrives as an ordered stream of chunks. The
//! runner owns the accumulation buffer; a transport owns nothing once its
//! stream is handed over.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// An ordered stream of response body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Asynchronous GET capability used to reach the callback URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET request and returns the body as a chunk stream.
    ///
    /// Implementations must deliver chunks in the order the network
    /// produced them and must map non-success statuses to
    /// [`TransportError::Status`].
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the request cannot be issued or
    /// the server answers with a non-success status.
    async fn get(&self, url: &Url) -> Result<BodyStream, TransportError>;
}

// ============================================================================
// Default HTTP Transport
// ============================================================================

/// The default transport, backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built,
    /// which indicates a broken TLS configuration.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("upcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { inner: client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<BodyStream, TransportError> {
        debug!(url = %url, "Issuing version-check GET");

        let response = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map(|bytes| bytes.to_vec()).map_err(map_reqwest)
        })))
    }
}

fn map_reqwest(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(error)
    }
}
