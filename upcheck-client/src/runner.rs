//! Request orchestration.
//!
//! The [`RequestRunner`] drives one version check end to end: build the
//! URL, issue the GET, accumulate the body, parse, persist, and deliver
//! the outcome to the host. It also acts as the scheduler's observer, so
//! a timer tick and a manual call take exactly the same path.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use futures::StreamExt;
use upcheck_core::{ResponseParser, VersionResponse};
use upcheck_store::StateStore;

use crate::error::CheckError;
use crate::transport::Transport;
use crate::url_builder::UrlBuilder;

// ============================================================================
// States & Outcomes
// ============================================================================

/// Whether an attempt is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Requesting,
}

/// Terminal outcome of the most recent check attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The check completed and the response was persisted.
    Succeeded,
    /// The request never produced a complete body.
    FailedTransport,
    /// The body arrived but could not be parsed.
    FailedParse,
    /// No valid URL could be built; nothing was attempted.
    FailedConfig,
}

/// Host callback for a successful check.
pub type SuccessHandler = Box<dyn Fn(VersionResponse) + Send + Sync>;
/// Host callback for a failed check.
pub type FailureHandler = Box<dyn Fn(CheckError) + Send + Sync>;

// ============================================================================
// Request Runner
// ============================================================================

/// Orchestrates version-check attempts.
///
/// At most one attempt is in flight per runner; a `check_version` call
/// while one is running is ignored. The persisted `last_check_date` moves
/// only on the success path, after the payload has fully validated, so a
/// failed attempt never counts as "checked".
pub struct RequestRunner {
    url_builder: UrlBuilder,
    transport: Arc<dyn Transport>,
    parser: Arc<dyn ResponseParser>,
    store: Arc<dyn StateStore>,
    on_success: SuccessHandler,
    on_failure: FailureHandler,
    state: Mutex<RunState>,
    last_outcome: Mutex<Option<CheckOutcome>>,
    attempt: Mutex<Option<JoinHandle<()>>>,
    invalidated: AtomicBool,
    weak_self: Weak<RequestRunner>,
    runtime: Handle,
}

impl RequestRunner {
    /// Creates a runner.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; attempts run as tasks
    /// on the current handle.
    pub fn new(
        url_builder: UrlBuilder,
        transport: Arc<dyn Transport>,
        parser: Arc<dyn ResponseParser>,
        store: Arc<dyn StateStore>,
        on_success: SuccessHandler,
        on_failure: FailureHandler,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            url_builder,
            transport,
            parser,
            store,
            on_success,
            on_failure,
            state: Mutex::new(RunState::Idle),
            last_outcome: Mutex::new(None),
            attempt: Mutex::new(None),
            invalidated: AtomicBool::new(false),
            weak_self: weak.clone(),
            runtime: Handle::current(),
        })
    }

    /// Starts a version check; returns immediately.
    ///
    /// The outcome arrives later through the success or failure callback.
    /// If a check is already in flight the call is a no-op.
    pub fn check_version(&self) {
        {
            let mut state = lock(&self.state);
            if *state == RunState::Requesting {
                debug!("Version check already in flight, ignoring");
                return;
            }
            *state = RunState::Requesting;
        }

        let url = match self.url_builder.url() {
            Ok(url) => url,
            Err(e) => {
                // Nothing was attempted; the last check date stays put.
                *lock(&self.state) = RunState::Idle;
                self.finish(CheckOutcome::FailedConfig, Err(e));
                return;
            }
        };

        let Some(runner) = self.weak_self.upgrade() else {
            return;
        };
        let task = self.runtime.spawn(async move {
            let (outcome, result) = runner.run_attempt(url).await;
            *lock(&runner.state) = RunState::Idle;
            runner.finish(outcome, result);
        });
        *lock(&self.attempt) = Some(task);
    }

    /// Returns the terminal outcome of the most recent attempt, if any.
    pub fn last_outcome(&self) -> Option<CheckOutcome> {
        *lock(&self.last_outcome)
    }

    /// Invalidates the runner: aborts any in-flight attempt and suppresses
    /// every future callback. Called on teardown by the owning facade.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
        if let Some(task) = lock(&self.attempt).take() {
            task.abort();
        }
    }

    async fn run_attempt(
        &self,
        url: Url,
    ) -> (CheckOutcome, Result<VersionResponse, CheckError>) {
        debug!(url = %url, "Starting version check");

        let mut body_stream = match self.transport.get(&url).await {
            Ok(stream) => stream,
            Err(e) => return (CheckOutcome::FailedTransport, Err(e.into())),
        };

        // Chunks are appended in arrival order; the parser sees the
        // complete body exactly once.
        let mut body = Vec::new();
        while let Some(chunk) = body_stream.next().await {
            match chunk {
                Ok(bytes) => body.extend_from_slice(&bytes),
                Err(e) => return (CheckOutcome::FailedTransport, Err(e.into())),
            }
        }

        let fields = match self.parser.parse(&body) {
            Ok(fields) => fields,
            Err(e) => return (CheckOutcome::FailedParse, Err(e.into())),
        };

        let response = fields.into_response();
        if let Err(e) = self.store.record_check(Utc::now(), response.clone()).await {
            // The check itself succeeded; persistence failure is the
            // store's problem, not the host's.
            warn!(error = %e, "Failed to persist version-check state");
        }

        (CheckOutcome::Succeeded, Ok(response))
    }

    fn finish(&self, outcome: CheckOutcome, result: Result<VersionResponse, CheckError>) {
        *lock(&self.last_outcome) = Some(outcome);

        if self.invalidated.load(Ordering::SeqCst) {
            debug!("Runner invalidated, suppressing callback");
            return;
        }

        match result {
            Ok(response) => (self.on_success)(response),
            Err(e) => {
                warn!(error = %e, "Version check failed");
                (self.on_failure)(e);
            }
        }
    }
}

impl crate::scheduler::PeriodObserver for RequestRunner {
    fn period_elapsed(&self) {
        self.check_version();
    }
}

impl Drop for RequestRunner {
    fn drop(&mut self) {
        self.invalidate();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use upcheck_core::{JsonResponseParser, ParseError};
    use upcheck_store::MemoryStateStore;

    use crate::error::TransportError;
    use crate::transport::BodyStream;

    /// Serves a fixed body in multiple chunks, optionally after a delay.
    struct StaticTransport {
        chunks: Vec<Vec<u8>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StaticTransport {
        fn new(body: &str) -> Self {
            // Split mid-token so the runner must reassemble chunks.
            let bytes = body.as_bytes();
            let mid = bytes.len() / 2;
            Self {
                chunks: vec![bytes[..mid].to_vec(), bytes[mid..].to_vec()],
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn get(&self, _url: &Url) -> Result<BodyStream, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let chunks: Vec<Result<Vec<u8>, TransportError>> =
                self.chunks.iter().cloned().map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    /// Always fails with a server error.
    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn get(&self, _url: &Url) -> Result<BodyStream, TransportError> {
            Err(TransportError::Status(500))
        }
    }

    type Deliveries = Arc<Mutex<Vec<Result<VersionResponse, CheckError>>>>;

    fn handlers() -> (Deliveries, SuccessHandler, FailureHandler) {
        let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
        let on_success = {
            let deliveries = Arc::clone(&deliveries);
            Box::new(move |response| lock(&deliveries).push(Ok(response))) as SuccessHandler
        };
        let on_failure = {
            let deliveries = Arc::clone(&deliveries);
            Box::new(move |error| lock(&deliveries).push(Err(error))) as FailureHandler
        };
        (deliveries, on_success, on_failure)
    }

    fn runner_with(
        transport: Arc<dyn Transport>,
        store: Arc<MemoryStateStore>,
    ) -> (Arc<RequestRunner>, Deliveries) {
        let (deliveries, on_success, on_failure) = handlers();
        let runner = RequestRunner::new(
            UrlBuilder::new("https://example.com/version", "v", 1),
            transport,
            Arc::new(JsonResponseParser::new()),
            store,
            on_success,
            on_failure,
        );
        (runner, deliveries)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn success_path_delivers_and_persists() {
        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(StaticTransport::new(
            r#"{"updateAvailable":true,"updateRequired":false,"latestVersionNumber":5}"#,
        ));
        let (runner, deliveries) = runner_with(transport, Arc::clone(&store));

        runner.check_version();
        settle().await;

        let delivered = lock(&deliveries);
        assert_eq!(delivered.len(), 1);
        let response = delivered[0].as_ref().unwrap();
        assert!(response.update_available);
        assert!(!response.update_required);
        assert_eq!(response.latest_version, Some(5));

        let state = store.state().await;
        assert!(state.last_check_date.is_some());
        assert_eq!(state.last_response.as_ref(), Some(response));
        assert_eq!(runner.last_outcome(), Some(CheckOutcome::Succeeded));
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_while_requesting_is_ignored() {
        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(
            StaticTransport::new(r#"{"updateAvailable":false,"updateRequired":false}"#)
                .with_delay(Duration::from_secs(5)),
        );
        let (runner, deliveries) = runner_with(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&store),
        );

        runner.check_version();
        tokio::task::yield_now().await;
        runner.check_version();
        runner.check_version();
        tokio::task::yield_now().await;

        // Only one transport operation may have been opened.
        assert_eq!(transport.calls(), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(lock(&deliveries).len(), 1);

        // Once idle again, a new check is allowed.
        runner.check_version();
        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn parse_failure_reports_and_leaves_date_untouched() {
        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(StaticTransport::new(r#"{"updateRequired":false}"#));
        let (runner, deliveries) = runner_with(transport, Arc::clone(&store));

        runner.check_version();
        settle().await;

        let delivered = lock(&deliveries);
        assert_eq!(delivered.len(), 1);
        assert!(matches!(
            delivered[0],
            Err(CheckError::Parse(ParseError::MissingRequiredField(_)))
        ));

        // A malformed answer is not a completed check.
        assert!(store.state().await.last_check_date.is_none());
        assert_eq!(runner.last_outcome(), Some(CheckOutcome::FailedParse));
    }

    #[tokio::test]
    async fn transport_failure_reports_and_leaves_date_untouched() {
        let store = Arc::new(MemoryStateStore::new());
        let (runner, deliveries) = runner_with(Arc::new(FailingTransport), Arc::clone(&store));

        runner.check_version();
        settle().await;

        let delivered = lock(&deliveries);
        assert_eq!(delivered.len(), 1);
        assert!(matches!(
            delivered[0],
            Err(CheckError::Transport(TransportError::Status(500)))
        ));
        assert!(store.state().await.last_check_date.is_none());
        assert_eq!(runner.last_outcome(), Some(CheckOutcome::FailedTransport));
    }

    #[tokio::test]
    async fn invalid_url_reports_configuration_error() {
        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(StaticTransport::new("{}"));
        let (deliveries, on_success, on_failure) = handlers();
        let runner = RequestRunner::new(
            UrlBuilder::new("definitely not a url", "v", 1),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(JsonResponseParser::new()),
            Arc::clone(&store) as Arc<dyn StateStore>,
            on_success,
            on_failure,
        );

        runner.check_version();
        settle().await;

        {
            let delivered = lock(&deliveries);
            assert_eq!(delivered.len(), 1);
            assert!(matches!(delivered[0], Err(CheckError::Configuration(_))));
        }

        // No transport operation was opened and nothing was recorded.
        assert_eq!(transport.calls(), 0);
        assert!(store.state().await.last_check_date.is_none());
        assert_eq!(runner.last_outcome(), Some(CheckOutcome::FailedConfig));

        // A configuration failure does not wedge the runner.
        runner.check_version();
        settle().await;
        assert_eq!(lock(&deliveries).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_suppresses_callbacks_mid_flight() {
        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(
            StaticTransport::new(r#"{"updateAvailable":true,"updateRequired":false}"#)
                .with_delay(Duration::from_secs(5)),
        );
        let (runner, deliveries) = runner_with(transport, Arc::clone(&store));

        runner.check_version();
        tokio::task::yield_now().await;
        runner.invalidate();

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;

        assert!(lock(&deliveries).is_empty());
        assert!(store.state().await.last_check_date.is_none());
    }

    #[tokio::test]
    async fn period_elapsed_runs_a_check() {
        use crate::scheduler::PeriodObserver;

        let store = Arc::new(MemoryStateStore::new());
        let transport = Arc::new(StaticTransport::new(
            r#"{"updateAvailable":false,"updateRequired":false}"#,
        ));
        let (runner, deliveries) = runner_with(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&store),
        );

        runner.period_elapsed();
        settle().await;

        assert_eq!(transport.calls(), 1);
        assert_eq!(lock(&deliveries).len(), 1);
    }
}
