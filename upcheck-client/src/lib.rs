// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # upcheck Client
//!
//! Scheduling, transport, and request orchestration for the upcheck
//! version-check client.
//!
//! This crate provides:
//!
//! - [`Scheduler`] - periodic "check now" notifications anchored to the
//!   last successful check
//! - [`UrlBuilder`] - deterministic poll-URL construction
//! - [`Transport`] - the asynchronous GET capability, with
//!   [`HttpTransport`] as the shipped `reqwest` default
//! - [`RequestRunner`] - the orchestration core driving one check from
//!   URL to persisted response
//! - The layered error taxonomy ([`CheckError`], [`TransportError`])

pub mod error;
pub mod runner;
pub mod scheduler;
pub mod transport;
pub mod url_builder;

pub use error::{CheckError, TransportError};
pub use runner::{CheckOutcome, FailureHandler, RequestRunner, SuccessHandler};
pub use scheduler::{PeriodObserver, Scheduler};
pub use transport::{BodyStream, HttpTransport, Transport};
pub use url_builder::UrlBuilder;
