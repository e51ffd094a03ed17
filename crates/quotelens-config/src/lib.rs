//! Shared configuration for the quotelens CLI and embedding hosts.
//!
//! TOML endpoint catalogs with a `QUOTELENS_` env overlay, translation to
//! the core's `EndpointSet` and the api crate's transport/retry settings,
//! plus the file-backed session store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use quotelens_core::{
    ColumnSpec, CoreError, EndpointConfig, EndpointSet, SessionError, SessionSnapshot,
    SessionStore,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("invalid endpoint catalog: {0}")]
    Catalog(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration: one explorer catalog per file.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExplorerConfig {
    /// Identifier scoping cache keys and the session slot.
    #[serde(default = "default_config_id")]
    pub config_id: String,

    /// Endpoint selected at startup when no session is restored.
    pub default_endpoint: Option<String>,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    /// Endpoint catalog, keyed by endpoint id.
    #[serde(default)]
    pub endpoints: IndexMap<String, EndpointEntry>,
}

fn default_config_id() -> String {
    "quotelens".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSettings {
    /// Exchange API base URL (e.g., "https://api.exchange.example").
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    pub user_agent: Option<String>,

    /// Headers sent on every request; endpoint headers win on conflict.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            headers: HashMap::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    #[serde(default = "default_evict_batch")]
    pub evict_batch: usize,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            evict_batch: default_evict_batch(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    50
}
fn default_evict_batch() -> usize {
    10
}
fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_delays_ms")]
    pub delays_ms: Vec<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delays_ms: default_delays_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_delays_ms() -> Vec<u64> {
    vec![1_000, 2_000, 4_000]
}

/// One `[endpoints.<id>]` table; the id comes from the table key.
#[derive(Debug, Deserialize, Serialize)]
pub struct EndpointEntry {
    pub label: Option<String>,
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub params: BTreeMap<String, Value>,

    #[serde(default = "default_cacheable")]
    pub cacheable: bool,

    #[serde(default = "default_cache_duration_ms")]
    pub cache_duration_ms: u64,

    pub transform: Option<String>,

    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

fn default_method() -> String {
    "GET".into()
}
fn default_cacheable() -> bool {
    true
}
fn default_cache_duration_ms() -> u64 {
    30_000
}

// ── Loading ─────────────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "quotelens", "quotelens").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("quotelens");
    p
}

/// Load and validate a config from `path` plus the `QUOTELENS_` env overlay.
pub fn load_config(path: &Path) -> Result<ExplorerConfig, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: ExplorerConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("QUOTELENS_").split("__"))
        .extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ExplorerConfig) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "api.base_url".into(),
            reason: "must be set".into(),
        });
    }
    if config.endpoints.is_empty() {
        return Err(ConfigError::Validation {
            field: "endpoints".into(),
            reason: "at least one endpoint must be configured".into(),
        });
    }
    // The catalog itself (methods, templates, default endpoint) is
    // validated by EndpointSet::new in endpoint_set().
    Ok(())
}

impl ExplorerConfig {
    /// Translate the `[endpoints]` tables into the core's validated catalog.
    pub fn endpoint_set(&self) -> Result<EndpointSet, ConfigError> {
        let endpoints: Vec<EndpointConfig> = self
            .endpoints
            .iter()
            .map(|(id, entry)| EndpointConfig {
                id: id.clone(),
                label: entry.label.clone(),
                url: entry.url.clone(),
                method: entry.method.clone(),
                headers: entry.headers.clone(),
                params: entry.params.clone(),
                cacheable: entry.cacheable,
                cache_duration_ms: entry.cache_duration_ms,
                transform: entry.transform.clone(),
                columns: entry.columns.clone(),
            })
            .collect();

        Ok(EndpointSet::new(
            self.config_id.clone(),
            self.default_endpoint.clone(),
            endpoints,
        )?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry
            .delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}

/// A commented starter config pointing at a public exchange API.
pub fn sample_config() -> &'static str {
    r##"# quotelens configuration
config_id = "kraken-public"
default_endpoint = "ticker"

[api]
base_url = "https://api.kraken.com"
timeout_secs = 30

[cache]
max_entries = 50
sweep_interval_secs = 60

[retry]
max_retries = 3
delays_ms = [1000, 2000, 4000]

[endpoints.ticker]
label = "Ticker"
url = "/0/public/Ticker"
cacheable = true
cache_duration_ms = 10000
transform = "keyed-rows"
columns = [
    { field = "symbol", label = "Pair" },
    { field = "c", label = "Last" },
    { field = "v", label = "Volume" },
]

[endpoints.trades]
label = "Recent trades"
url = "/0/public/Trades"
cacheable = false
[endpoints.trades.params]
pair = "XBTUSD"

[endpoints.assets]
label = "Assets"
url = "/0/public/Assets"
cacheable = true
cache_duration_ms = 300000
transform = "keyed-rows"
"##
}

// ── File-backed session store ───────────────────────────────────────

/// One JSON blob per session key under the platform data directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Store rooted at the platform data dir (`.../quotelens/sessions`).
    pub fn new() -> Self {
        let dir = ProjectDirs::from("io", "quotelens", "quotelens").map_or_else(
            || {
                let mut p = dirs_fallback();
                p.push("sessions");
                p
            },
            |dirs| dirs.data_dir().join("sessions"),
        );
        Self { dir }
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, key: &str, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(self.slot_path(key), json)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        let path = self.slot_path(key);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
