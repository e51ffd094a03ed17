// ── Unified state snapshot ──
//
// The single authoritative mutable state per runtime. Every mutation
// replaces the whole snapshot atomically through a watch channel, so
// readers never observe a partially-updated view.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Metadata about the most recent load.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub status_code: u16,
    pub response_time_ms: u64,
    pub data_count: usize,
    pub from_cache: bool,
    pub timestamp: DateTime<Utc>,
}

/// The canonical state snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedState {
    pub config_id: String,
    pub current_endpoint: Option<String>,
    pub parameters: BTreeMap<String, Value>,
    pub table_data: Arc<Vec<Value>>,
    pub sidebar_data: Option<Value>,
    pub selected_row: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
    pub connection_status: ConnectionStatus,
    pub response_metadata: Option<ResponseMetadata>,
    pub sidebar_collapsed: bool,
    pub sidebar_pinned: bool,
}

impl UnifiedState {
    pub fn new(config_id: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            current_endpoint: None,
            parameters: BTreeMap::new(),
            table_data: Arc::new(Vec::new()),
            sidebar_data: None,
            selected_row: None,
            loading: false,
            error: None,
            connection_status: ConnectionStatus::Disconnected,
            response_metadata: None,
            sidebar_collapsed: false,
            sidebar_pinned: false,
        }
    }

    /// Wipe the per-endpoint slate: data, selection, and error.
    ///
    /// Called on endpoint switch before any network activity so stale
    /// data never leaks into the new context.
    pub(crate) fn reset_data(&mut self) {
        self.parameters = BTreeMap::new();
        self.table_data = Arc::new(Vec::new());
        self.sidebar_data = None;
        self.selected_row = None;
        self.error = None;
        self.response_metadata = None;
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_data_but_keeps_ui_flags() {
        let mut state = UnifiedState::new("lens");
        state.sidebar_pinned = true;
        state.error = Some("boom".into());
        state.table_data = Arc::new(vec![serde_json::json!({ "a": 1 })]);
        state.parameters.insert("pair".into(), serde_json::json!("BTC-USD"));

        state.reset_data();

        assert!(state.table_data.is_empty());
        assert!(state.parameters.is_empty());
        assert!(state.error.is_none());
        assert!(state.sidebar_pinned);
    }
}
