//! quotelens-core: the endpoint data-fetching runtime.
//!
//! Pairs a reactive state store with the `quotelens-api` execution layer,
//! adding a TTL cache, a bounded event log, and session persistence.
//! Components are constructed explicitly and wired by composition -- see
//! [`EndpointRuntime::new`].

pub mod cache;
pub mod error;
pub mod events;
pub mod model;
pub mod runtime;
pub mod session;
pub mod state;
pub mod transform;

pub use cache::{CacheConfig, CacheStore, cache_key};
pub use error::CoreError;
pub use events::{EVENT_LOG_CAPACITY, Event, EventLog, StateEvent};
pub use model::{ColumnSpec, EndpointConfig, EndpointSet};
pub use runtime::{CachedPayload, EndpointRuntime};
pub use session::{
    MemorySessionStore, SCHEMA_VERSION, SessionError, SessionSnapshot, SessionStore, session_key,
};
pub use state::{ConnectionStatus, ResponseMetadata, UnifiedState};
pub use transform::{
    DataTransform, KeyedRows, SummarySplit, TransformError, TransformOutcome, TransformRegistry,
    unwrap_envelope,
};
