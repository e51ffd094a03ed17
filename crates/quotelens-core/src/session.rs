// ── Session persistence contract ──
//
// Only a whitelisted slice of state is persisted, under one slot per
// configuration. Restoration is gated behind a caller-supplied policy --
// the storage layer itself never prompts.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Current persisted-blob schema. Bump on incompatible changes; loads of
/// a different version are treated as nothing-to-restore.
pub const SCHEMA_VERSION: u32 = 1;

/// Storage key for a configuration: `"quotelens-<configId>"`.
pub fn session_key(config_id: &str) -> String {
    format!("quotelens-{config_id}")
}

/// The whitelisted slice of state that survives restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub schema_version: u32,
    pub current_endpoint: Option<String>,
    pub parameters: BTreeMap<String, Value>,
    pub sidebar_collapsed: bool,
    pub sidebar_pinned: bool,
}

impl SessionSnapshot {
    pub fn new(
        current_endpoint: Option<String>,
        parameters: BTreeMap<String, Value>,
        sidebar_collapsed: bool,
        sidebar_pinned: bool,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            current_endpoint,
            parameters,
            sidebar_collapsed,
            sidebar_pinned,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session blob is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Keyed storage for session snapshots.
///
/// Implementations are expected to be cheap; the runtime calls `save`
/// from a spawned task so slow stores still never block mutations.
pub trait SessionStore: Send + Sync {
    fn save(&self, key: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError>;

    /// `Ok(None)` means nothing to restore.
    fn load(&self, key: &str) -> Result<Option<SessionSnapshot>, SessionError>;

    fn clear(&self, key: &str) -> Result<(), SessionError>;
}

/// In-memory store for tests and embedding hosts without a filesystem.
#[derive(Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<String, SessionSnapshot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, key: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_owned(), snapshot.clone());
        }
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(key).cloned()))
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(key);
        }
        Ok(())
    }
}
