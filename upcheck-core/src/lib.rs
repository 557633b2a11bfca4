// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # upcheck Core
//!
//! Core types, models, and traits for the upcheck version-check client.
//!
//! This crate provides the foundational abstractions used across the other
//! upcheck crates:
//!
//! - [`VersionResponse`] - the persisted verdict of a successful check
//! - [`VersionFields`] - the field set a parser extracts from a payload
//! - [`CheckPeriod`] - how often automatic checks run
//! - [`ResponseParser`] - the payload-decoding capability, with
//!   [`JsonResponseParser`] as the shipped default
//! - Error types ([`CoreError`], [`ParseError`])

pub mod error;
pub mod models;
pub mod parser;

// Re-export error types
pub use error::{CoreError, ParseError};

// Re-export all model types
pub use models::{CheckPeriod, VersionFields, VersionResponse};

// Re-export the parser capability
pub use parser::{JsonResponseParser, ResponseParser, keys};
