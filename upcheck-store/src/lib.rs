// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # upcheck Store
//!
//! Durable state for the upcheck version-check client.
//!
//! This crate provides:
//!
//! - [`StateStore`] - the durable key-value capability the request runner
//!   persists through
//! - [`FileStateStore`] - JSON-file persistence with atomic writes
//! - [`MemoryStateStore`] - in-process state for hosts without disk needs
//! - [`VersionState`] - the single persisted record

pub mod error;
pub mod persistence;
pub mod state_store;

pub use error::StoreError;
pub use persistence::{default_state_dir, default_state_path, load_json, save_json};
pub use state_store::{FileStateStore, MemoryStateStore, StateStore, VersionState};
