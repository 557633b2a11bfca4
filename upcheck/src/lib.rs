// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # upcheck
//!
//! An embeddable version-check client. It periodically polls a remote
//! endpoint to learn whether a newer application version exists, whether
//! the update is mandatory, and since when it became available, then
//! informs the embedding application through a callback and persists the
//! outcome for offline inspection.
//!
//! ## Usage
//!
//! ```ignore
//! use upcheck::{CheckPeriod, CheckerConfig, VersionChecker};
//!
//! let checker = VersionChecker::builder(CheckerConfig::new(
//!     "https://example.com/version",
//!     "v",
//!     42,
//! ))
//! .period(CheckPeriod::Daily)
//! .on_success(|response| println!("update available: {}", response.update_available))
//! .on_failure(|error| eprintln!("check failed: {error}"))
//! .build()
//! .await?;
//!
//! // Checks also run automatically once per period.
//! checker.check_version();
//! ```

pub mod checker;
pub mod config;

pub use checker::{VersionChecker, VersionCheckerBuilder};
pub use config::CheckerConfig;

// Re-export the capability contracts and value types hosts interact with.
pub use upcheck_client::{
    BodyStream, CheckError, CheckOutcome, HttpTransport, PeriodObserver, Scheduler, Transport,
    TransportError,
};
pub use upcheck_core::{
    CheckPeriod, CoreError, JsonResponseParser, ParseError, ResponseParser, VersionFields,
    VersionResponse,
};
pub use upcheck_store::{FileStateStore, MemoryStateStore, StateStore, StoreError, VersionState};
