//! The version-checker facade.
//!
//! Wires the scheduler, request runner, and state store together behind
//! one handle the host owns. Construction loads the persisted state so a
//! process restart resumes the correct countdown; dropping the handle
//! tears everything down and suppresses any still-pending callbacks.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Weak};
use tracing::info;

use upcheck_client::{
    CheckError, CheckOutcome, FailureHandler, HttpTransport, PeriodObserver, RequestRunner,
    Scheduler, SuccessHandler, Transport, UrlBuilder,
};
use upcheck_core::{CheckPeriod, JsonResponseParser, ResponseParser, VersionResponse};
use upcheck_store::{FileStateStore, StateStore};

use crate::config::CheckerConfig;

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`VersionChecker`].
///
/// Only the configuration and the two outcome callbacks are required;
/// every capability (transport, parser, store, scheduler) has a shipped
/// default and can be replaced by the host.
pub struct VersionCheckerBuilder {
    config: CheckerConfig,
    callback_url: Option<String>,
    scheduler: Option<Scheduler>,
    period: Option<CheckPeriod>,
    transport: Option<Arc<dyn Transport>>,
    parser: Option<Arc<dyn ResponseParser>>,
    store: Option<Arc<dyn StateStore>>,
    on_success: Option<SuccessHandler>,
    on_failure: Option<FailureHandler>,
}

impl VersionCheckerBuilder {
    fn new(config: CheckerConfig) -> Self {
        Self {
            config,
            callback_url: None,
            scheduler: None,
            period: None,
            transport: None,
            parser: None,
            store: None,
            on_success: None,
            on_failure: None,
        }
    }

    /// Uses an explicit callback URL, overriding both the configured
    /// default and any persisted override.
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Schedules automatic checks at the given period.
    pub fn period(mut self, period: CheckPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Uses a pre-built scheduler instead of one created from
    /// [`period`](Self::period).
    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Replaces the default HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the default JSON response parser.
    pub fn parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Replaces the default file-backed state store.
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the callback invoked after each successful check.
    pub fn on_success(mut self, f: impl Fn(VersionResponse) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Sets the callback invoked after each failed check.
    pub fn on_failure(mut self, f: impl Fn(CheckError) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    /// Builds the checker: loads persisted state, resolves the callback
    /// URL (explicit argument, then persisted override, then configured
    /// default), wires the runner as the scheduler's observer, and starts
    /// scheduling from the persisted last-check date.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Configuration` when a callback is missing and
    /// `CheckError::Transport` when the default HTTP transport cannot be
    /// built.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub async fn build(self) -> Result<VersionChecker, CheckError> {
        let on_success = self.on_success.ok_or_else(|| {
            CheckError::Configuration("success callback not set".to_string())
        })?;
        let on_failure = self.on_failure.ok_or_else(|| {
            CheckError::Configuration("failure callback not set".to_string())
        })?;

        let store: Arc<dyn StateStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStateStore::load_default().await),
        };
        let state = store.state().await;

        let callback_url = self
            .callback_url
            .or(state.callback_url_override)
            .unwrap_or_else(|| self.config.callback_url.clone());

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };
        let parser: Arc<dyn ResponseParser> = self
            .parser
            .unwrap_or_else(|| Arc::new(JsonResponseParser::new()));

        let runner = RequestRunner::new(
            UrlBuilder::new(
                callback_url.clone(),
                self.config.version_key,
                self.config.version_number,
            ),
            transport,
            parser,
            Arc::clone(&store),
            on_success,
            on_failure,
        );

        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Scheduler::new(self.period.unwrap_or_default()));
        let observer: Weak<dyn PeriodObserver> =
            Arc::downgrade(&(Arc::clone(&runner) as Arc<dyn PeriodObserver>));
        scheduler.set_observer(observer);
        scheduler.start_scheduling(state.last_check_date);

        info!(
            callback_url = %callback_url,
            period = %scheduler.period(),
            last_check = ?state.last_check_date,
            "Version checker started"
        );

        Ok(VersionChecker {
            runner,
            scheduler,
            store,
            callback_url,
        })
    }
}

// ============================================================================
// Facade
// ============================================================================

/// The embeddable version-check client.
pub struct VersionChecker {
    runner: Arc<RequestRunner>,
    scheduler: Scheduler,
    store: Arc<dyn StateStore>,
    callback_url: String,
}

impl VersionChecker {
    /// Starts building a checker from the host configuration.
    pub fn builder(config: CheckerConfig) -> VersionCheckerBuilder {
        VersionCheckerBuilder::new(config)
    }

    /// Triggers a manual version check; returns immediately.
    ///
    /// The outcome arrives through the callbacks given at construction.
    /// Ignored when a check is already in flight.
    pub fn check_version(&self) {
        self.runner.check_version();
    }

    /// Returns the most recently persisted response, or `None` if no
    /// check has ever succeeded.
    pub async fn last_response(&self) -> Option<VersionResponse> {
        self.store.state().await.last_response
    }

    /// Returns when the last successful check completed.
    pub async fn date_of_last_version_check(&self) -> Option<DateTime<Utc>> {
        self.store.state().await.last_check_date
    }

    /// Returns the terminal outcome of the most recent attempt.
    pub fn last_outcome(&self) -> Option<CheckOutcome> {
        self.runner.last_outcome()
    }

    /// The callback URL this checker polls.
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

impl Drop for VersionChecker {
    fn drop(&mut self) {
        // The scheduler cancels itself on drop; the runner must also stop
        // delivering into a host that no longer exists.
        self.runner.invalidate();
        self.scheduler.cancel();
    }
}
