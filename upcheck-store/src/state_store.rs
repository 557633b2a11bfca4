//! Durable version-check state.
//!
//! The request runner records the outcome of each successful check through
//! the [`StateStore`] capability; the facade reads it back at construction
//! so a process restart resumes the correct countdown. Two implementations
//! ship with the library: [`FileStateStore`] for JSON-file persistence and
//! [`MemoryStateStore`] for hosts that keep state in-process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use upcheck_core::VersionResponse;

use crate::error::StoreError;
use crate::persistence::{default_state_path, load_json, save_json};

// ============================================================================
// Persisted Record
// ============================================================================

/// The complete persisted state of one version-check client.
///
/// Kept as a single record so the date and the response it belongs to are
/// always written together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionState {
    /// When the last successful check completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_date: Option<DateTime<Utc>>,

    /// The response from the last successful check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_response: Option<VersionResponse>,

    /// Host-set callback URL override, taking precedence over the
    /// configured default at construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url_override: Option<String>,
}

// ============================================================================
// Store Capability
// ============================================================================

/// Durable key-value storage for version-check state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns a snapshot of the current state.
    async fn state(&self) -> VersionState;

    /// Records a successful check: the response and its check date are
    /// stored in one write, replacing the previous pair wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be made durable.
    async fn record_check(
        &self,
        at: DateTime<Utc>,
        response: VersionResponse,
    ) -> Result<(), StoreError>;

    /// Sets or clears the callback URL override.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be made durable.
    async fn set_callback_url_override(&self, url: Option<String>) -> Result<(), StoreError>;
}

// ============================================================================
// File-Backed Store
// ============================================================================

/// JSON-file-backed state store.
pub struct FileStateStore {
    path: PathBuf,
    state: RwLock<VersionState>,
}

impl FileStateStore {
    /// Loads the store from the default platform state path.
    pub async fn load_default() -> Self {
        Self::load(default_state_path()).await
    }

    /// Loads the store from a path.
    ///
    /// A missing or unreadable file starts the store from an empty state;
    /// the first successful check will create it.
    pub async fn load(path: PathBuf) -> Self {
        let state = if path.exists() {
            match load_json(&path).await {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load state, starting empty");
                    VersionState::default()
                }
            }
        } else {
            debug!(path = %path.display(), "State file not found, starting empty");
            VersionState::default()
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    async fn save(&self, state: &VersionState) -> Result<(), StoreError> {
        save_json(&self.path, state).await
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn state(&self) -> VersionState {
        self.state.read().await.clone()
    }

    async fn record_check(
        &self,
        at: DateTime<Utc>,
        response: VersionResponse,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.last_check_date = Some(at);
        state.last_response = Some(response);
        self.save(&state).await
    }

    async fn set_callback_url_override(&self, url: Option<String>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.callback_url_override = url;
        self.save(&state).await
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-process state store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<VersionState>,
}

impl MemoryStateStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given state.
    pub fn with_state(state: VersionState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn state(&self) -> VersionState {
        self.state.read().await.clone()
    }

    async fn record_check(
        &self,
        at: DateTime<Utc>,
        response: VersionResponse,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.last_check_date = Some(at);
        state.last_response = Some(response);
        Ok(())
    }

    async fn set_callback_url_override(&self, url: Option<String>) -> Result<(), StoreError> {
        self.state.write().await.callback_url_override = url;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
