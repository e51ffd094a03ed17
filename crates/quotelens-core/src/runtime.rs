// ── Endpoint runtime ──
//
// Orchestrates cache + executor per logical load, owns the canonical
// state snapshot, and records every transition in the event log.
// Cheaply cloneable via `Arc<RuntimeInner>`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use quotelens_api::{ApiRequest, HttpExecutor};

use crate::cache::{CacheConfig, CacheStore, cache_key};
use crate::error::CoreError;
use crate::events::{EventLog, StateEvent};
use crate::model::{EndpointConfig, EndpointSet};
use crate::session::{SCHEMA_VERSION, SessionSnapshot, SessionStore, session_key};
use crate::state::{ConnectionStatus, ResponseMetadata, UnifiedState};
use crate::transform::{TransformOutcome, TransformRegistry, unwrap_envelope};

/// What one successful load leaves in the cache.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub rows: Arc<Vec<Value>>,
    pub sidebar: Option<Value>,
    pub status: u16,
}

/// The state orchestrator.
///
/// Exactly one instance is authoritative per explorer configuration. All
/// state and cache writes go through its methods; consumers observe
/// snapshots through [`state`](Self::state) or [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct EndpointRuntime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    endpoints: EndpointSet,
    transforms: TransformRegistry,
    executor: HttpExecutor,
    cache: Arc<CacheStore<CachedPayload>>,
    events: EventLog,
    session: Arc<dyn SessionStore>,
    state: watch::Sender<Arc<UnifiedState>>,
    /// Bumped by every endpoint/parameter mutation; in-flight loads carry
    /// the generation they were issued under and discard their result if
    /// it no longer matches (staleness guard).
    generation: AtomicU64,
    /// Saves are silent no-ops until persistence is confirmed.
    persistence_enabled: AtomicBool,
    cancel: CancellationToken,
}

impl EndpointRuntime {
    /// Wire a runtime from its collaborators and start the cache sweeper.
    pub fn new(
        endpoints: EndpointSet,
        transforms: TransformRegistry,
        executor: HttpExecutor,
        cache_config: CacheConfig,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let cache = Arc::new(CacheStore::new(cache_config));
        let cancel = CancellationToken::new();
        cache.spawn_sweeper(cancel.clone());

        let initial = Arc::new(UnifiedState::new(endpoints.config_id()));
        let (state, _) = watch::channel(initial);

        Self {
            inner: Arc::new(RuntimeInner {
                endpoints,
                transforms,
                executor,
                cache,
                events: EventLog::new(),
                session,
                state,
                generation: AtomicU64::new(0),
                persistence_enabled: AtomicBool::new(false),
                cancel,
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn endpoints(&self) -> &EndpointSet {
        &self.inner.endpoints
    }

    /// Current state snapshot (cheap `Arc` clone).
    pub fn state(&self) -> Arc<UnifiedState> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<UnifiedState>> {
        self.inner.state.subscribe()
    }

    pub fn events(&self) -> &EventLog {
        &self.inner.events
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Set the initial endpoint, optionally restoring the persisted
    /// session.
    ///
    /// `should_restore` is the caller-supplied confirmation policy: it is
    /// consulted only when a compatible saved session exists. Accepting
    /// the restore also arms future saves.
    pub fn initialize<F>(&self, should_restore: F)
    where
        F: FnOnce(&SessionSnapshot) -> bool,
    {
        let key = session_key(self.inner.endpoints.config_id());

        let saved = match self.inner.session.load(&key) {
            Ok(saved) => saved,
            Err(err) => {
                warn!(%err, "failed to read saved session, starting from defaults");
                None
            }
        };

        if let Some(snapshot) = saved {
            if snapshot.schema_version != SCHEMA_VERSION {
                warn!(
                    saved = snapshot.schema_version,
                    supported = SCHEMA_VERSION,
                    "saved session has an incompatible schema version, ignoring"
                );
            } else if should_restore(&snapshot) {
                self.adopt_session(snapshot);
                return;
            }
        }

        let default = self.inner.endpoints.default_endpoint().to_owned();
        self.mutate(|state| {
            state.reset_data();
            state.current_endpoint = Some(default.clone());
        });
        self.inner.events.emit(StateEvent::EndpointChanged {
            old: None,
            new: default,
        });
    }

    /// Stop background tasks. Idempotent.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Switch the current endpoint, wiping the per-endpoint slate before
    /// any network activity.
    pub fn update_endpoint(&self, id: &str) -> Result<(), CoreError> {
        if !self.inner.endpoints.contains(id) {
            return Err(CoreError::UnknownEndpoint { id: id.to_owned() });
        }

        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let mut old = None;
        self.mutate(|state| {
            old = state.current_endpoint.clone();
            state.reset_data();
            state.current_endpoint = Some(id.to_owned());
        });

        self.inner.events.emit(StateEvent::EndpointChanged {
            old,
            new: id.to_owned(),
        });
        self.schedule_save();
        Ok(())
    }

    /// Shallow-merge a parameter patch. `Value::Null` deletes the key.
    pub fn update_parameters(&self, patch: BTreeMap<String, Value>) {
        if patch.is_empty() {
            return;
        }

        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let changed: Vec<String> = patch.keys().cloned().collect();
        self.mutate(|state| {
            for (key, value) in patch {
                if value.is_null() {
                    state.parameters.remove(&key);
                } else {
                    state.parameters.insert(key, value);
                }
            }
        });

        self.inner
            .events
            .emit(StateEvent::ParametersUpdated { changed });
        self.schedule_save();
    }

    /// Select a row (forcing the sidebar open) or clear the selection.
    pub fn select_row(&self, row: Option<Value>) {
        let selecting = row.is_some();
        self.mutate(|state| {
            state.selected_row = row;
            if selecting {
                state.sidebar_collapsed = false;
            }
        });

        if selecting {
            let endpoint = self.state().current_endpoint.clone().unwrap_or_default();
            self.inner.events.emit(StateEvent::RowSelected { endpoint });
        } else {
            self.inner.events.emit(StateEvent::RowCleared);
        }
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.mutate(|state| state.sidebar_collapsed = collapsed);
        self.emit_sidebar_changed();
        self.schedule_save();
    }

    pub fn set_sidebar_pinned(&self, pinned: bool) {
        self.mutate(|state| state.sidebar_pinned = pinned);
        self.emit_sidebar_changed();
        self.schedule_save();
    }

    fn emit_sidebar_changed(&self) {
        let state = self.state();
        self.inner.events.emit(StateEvent::SidebarChanged {
            collapsed: state.sidebar_collapsed,
            pinned: state.sidebar_pinned,
        });
    }

    // ── Load ─────────────────────────────────────────────────────────

    /// Load the current endpoint: cache hit short-circuits the network;
    /// a miss executes, transforms, caches, and commits -- unless the
    /// endpoint or parameters changed while the request was in flight,
    /// in which case the late result is discarded silently.
    pub async fn load(&self) -> Result<(), CoreError> {
        let snapshot = self.state();
        let endpoint_id = snapshot
            .current_endpoint
            .clone()
            .ok_or(CoreError::NoEndpointSelected)?;
        let endpoint =
            self.inner
                .endpoints
                .get(&endpoint_id)
                .ok_or_else(|| CoreError::UnknownEndpoint {
                    id: endpoint_id.clone(),
                })?;

        let generation = self.inner.generation.load(Ordering::SeqCst);

        // Endpoint defaults under call-time parameters, call-time wins.
        let mut params = endpoint.params.clone();
        params.extend(snapshot.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));

        let key = cache_key(self.inner.endpoints.config_id(), &endpoint_id, &params);

        if endpoint.cacheable {
            if let Some(hit) = self.inner.cache.get(&key) {
                debug!(endpoint = %endpoint_id, "cache hit");
                self.commit_payload(&endpoint_id, &hit, true, 0);
                return Ok(());
            }
        }

        self.mutate(|state| {
            state.loading = true;
            state.error = None;
            state.connection_status = ConnectionStatus::Connecting;
        });

        let request = ApiRequest {
            method: parse_method(&endpoint.method),
            path: endpoint.url.clone(),
            headers: endpoint.headers.clone(),
            params: params.clone(),
        };

        let result = self.inner.executor.execute(&request).await;

        // Staleness guard: the context this load was issued for must still
        // be current, otherwise the late result is treated as cancelled.
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            debug!(endpoint = %endpoint_id, "discarding stale load result");
            self.mutate(|state| state.loading = false);
            return Ok(());
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let message = err.to_string();
                self.fail_load(&endpoint_id, &message);
                return Err(err.into());
            }
        };

        let outcome = match self.apply_transform(&endpoint, &response.body) {
            Ok(outcome) => outcome,
            Err(err) => {
                let message = format!("Invalid data format: {err}");
                self.fail_load(&endpoint_id, &message);
                return Err(err.into());
            }
        };

        let payload = CachedPayload {
            rows: Arc::new(outcome.rows),
            sidebar: outcome.sidebar,
            status: response.status,
        };

        if endpoint.cacheable {
            self.inner.cache.set(
                key,
                payload.clone(),
                Duration::from_millis(endpoint.cache_duration_ms),
                endpoint_id.clone(),
            );
        }

        let response_time_ms =
            u64::try_from(response.elapsed.as_millis()).unwrap_or(u64::MAX);
        self.commit_payload(&endpoint_id, &payload, false, response_time_ms);
        Ok(())
    }

    // ── Cache management ─────────────────────────────────────────────

    /// Drop cached entries for one endpoint, or all of them.
    pub fn clear_cache(&self, endpoint_id: Option<&str>) -> usize {
        let removed = self.inner.cache.clear(endpoint_id);
        self.inner.events.emit(StateEvent::CacheCleared {
            endpoint: endpoint_id.map(ToOwned::to_owned),
            removed,
        });
        removed
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Arm (or disarm) session saves without going through a restore.
    pub fn set_persistence_enabled(&self, enabled: bool) {
        self.inner
            .persistence_enabled
            .store(enabled, Ordering::SeqCst);
    }

    /// Read the saved session without adopting it.
    pub fn saved_session(&self) -> Result<Option<SessionSnapshot>, CoreError> {
        let key = session_key(self.inner.endpoints.config_id());
        self.inner
            .session
            .load(&key)
            .map_err(|err| CoreError::Session {
                message: err.to_string(),
            })
    }

    /// Remove the stored slot and disarm future saves.
    pub fn clear_session(&self) -> Result<(), CoreError> {
        let key = session_key(self.inner.endpoints.config_id());
        self.inner
            .session
            .clear(&key)
            .map_err(|err| CoreError::Session {
                message: err.to_string(),
            })?;
        self.set_persistence_enabled(false);
        Ok(())
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Apply a mutation as one atomic snapshot replacement.
    fn mutate(&self, f: impl FnOnce(&mut UnifiedState)) {
        self.inner.state.send_modify(|current| {
            let mut next = (**current).clone();
            f(&mut next);
            *current = Arc::new(next);
        });
    }

    fn adopt_session(&self, snapshot: SessionSnapshot) {
        let endpoint = match snapshot.current_endpoint {
            Some(ref id) if self.inner.endpoints.contains(id) => Some(id.clone()),
            Some(ref id) => {
                warn!(endpoint = %id, "saved endpoint no longer configured, using default");
                Some(self.inner.endpoints.default_endpoint().to_owned())
            }
            None => Some(self.inner.endpoints.default_endpoint().to_owned()),
        };

        self.mutate(|state| {
            state.reset_data();
            state.current_endpoint = endpoint.clone();
            state.parameters = snapshot.parameters.clone();
            state.sidebar_collapsed = snapshot.sidebar_collapsed;
            state.sidebar_pinned = snapshot.sidebar_pinned;
        });
        self.set_persistence_enabled(true);
        self.inner
            .events
            .emit(StateEvent::SessionRestored { endpoint });
    }

    fn apply_transform(
        &self,
        endpoint: &EndpointConfig,
        body: &Value,
    ) -> Result<TransformOutcome, crate::transform::TransformError> {
        match endpoint.transform.as_deref() {
            Some(name) => match self.inner.transforms.get(name) {
                Some(transform) => transform.apply(body),
                None => {
                    warn!(transform = name, "transform not registered, falling back to envelope unwrapping");
                    Ok(unwrap_envelope(body))
                }
            },
            None => Ok(unwrap_envelope(body)),
        }
    }

    fn commit_payload(
        &self,
        endpoint_id: &str,
        payload: &CachedPayload,
        from_cache: bool,
        response_time_ms: u64,
    ) {
        let rows = payload.rows.len();
        self.mutate(|state| {
            state.table_data = Arc::clone(&payload.rows);
            state.sidebar_data = payload.sidebar.clone();
            state.loading = false;
            state.error = None;
            state.connection_status = ConnectionStatus::Connected;
            state.response_metadata = Some(ResponseMetadata {
                status_code: payload.status,
                response_time_ms,
                data_count: rows,
                from_cache,
                timestamp: Utc::now(),
            });
        });

        self.inner.events.emit(StateEvent::DataLoaded {
            endpoint: endpoint_id.to_owned(),
            rows,
            from_cache,
            response_time_ms,
        });
    }

    fn fail_load(&self, endpoint_id: &str, message: &str) {
        self.mutate(|state| {
            state.loading = false;
            state.error = Some(message.to_owned());
            state.connection_status = ConnectionStatus::Disconnected;
            state.response_metadata = None;
        });

        self.inner.events.emit(StateEvent::DataError {
            endpoint: endpoint_id.to_owned(),
            message: message.to_owned(),
        });
    }

    /// Persist the whitelisted state slice without blocking the caller.
    ///
    /// Silent no-op until persistence has been confirmed.
    fn schedule_save(&self) {
        if !self.inner.persistence_enabled.load(Ordering::SeqCst) {
            return;
        }

        let state = self.state();
        let snapshot = SessionSnapshot::new(
            state.current_endpoint.clone(),
            state.parameters.clone(),
            state.sidebar_collapsed,
            state.sidebar_pinned,
        );
        let key = session_key(self.inner.endpoints.config_id());
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            match inner.session.save(&key, &snapshot) {
                Ok(()) => inner.events.emit(StateEvent::SessionSaved),
                Err(err) => warn!(%err, "failed to persist session"),
            }
        });
    }
}

fn parse_method(method: &str) -> Method {
    // Validated at EndpointSet construction; GET is a safe fallback.
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET)
}
