// ── State-transition event log ──
//
// Bounded append-only record of runtime mutations, for logging and
// telemetry. Pure observer: nothing in the runtime branches on it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Only the most recent events are retained; older ones are dropped FIFO.
pub const EVENT_LOG_CAPACITY: usize = 100;

const BROADCAST_CHANNEL_SIZE: usize = 256;

/// One state transition. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StateEvent {
    EndpointChanged {
        old: Option<String>,
        new: String,
    },
    ParametersUpdated {
        changed: Vec<String>,
    },
    DataLoaded {
        endpoint: String,
        rows: usize,
        from_cache: bool,
        response_time_ms: u64,
    },
    DataError {
        endpoint: String,
        message: String,
    },
    RowSelected {
        endpoint: String,
    },
    RowCleared,
    SidebarChanged {
        collapsed: bool,
        pinned: bool,
    },
    SessionSaved,
    SessionRestored {
        endpoint: Option<String>,
    },
    CacheCleared {
        endpoint: Option<String>,
        removed: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: StateEvent,
    pub at: DateTime<Utc>,
}

/// Append-only log of the last [`EVENT_LOG_CAPACITY`] events, with a
/// broadcast channel for live consumers.
///
/// Consumers that need more history than the cap must snapshot eagerly.
pub struct EventLog {
    entries: Mutex<VecDeque<Arc<Event>>>,
    capacity: usize,
    tx: broadcast::Sender<Arc<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CHANNEL_SIZE);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            tx,
        }
    }

    /// Append an event, evicting the oldest entry when at capacity.
    pub fn emit(&self, kind: StateEvent) {
        let event = Arc::new(Event {
            kind,
            at: Utc::now(),
        });

        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(Arc::clone(&event));
        }

        // Zero receivers is fine; the log itself is the durable record.
        let _ = self.tx.send(event);
    }

    /// Snapshot of the retained events, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cap_keeps_last_100_in_order() {
        let log = EventLog::new();
        for i in 0..150 {
            log.emit(StateEvent::ParametersUpdated {
                changed: vec![format!("p{i}")],
            });
        }

        let events = log.snapshot();
        assert_eq!(events.len(), 100);

        // Oldest retained is event 50, newest is 149, original order kept.
        let first = &events[0].kind;
        let last = &events[99].kind;
        assert!(matches!(first, StateEvent::ParametersUpdated { changed } if changed == &vec!["p50".to_owned()]));
        assert!(matches!(last, StateEvent::ParametersUpdated { changed } if changed == &vec!["p149".to_owned()]));
    }

    #[tokio::test]
    async fn subscribers_receive_live_events() {
        let log = EventLog::new();
        let mut rx = log.subscribe();

        log.emit(StateEvent::RowCleared);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event.kind, StateEvent::RowCleared));
    }

    #[test]
    fn snapshot_of_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert!(log.snapshot().is_empty());
    }
}
