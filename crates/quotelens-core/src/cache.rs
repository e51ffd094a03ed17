// ── TTL response cache ──
//
// Advisory cache keyed by config + endpoint + sorted parameters. Expired
// entries are treated as absent: dropped on read and swept periodically
// by a background task. No cache operation can fail -- a miss always
// falls back to the network.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use quotelens_api::request::stringify;

/// Deterministic cache key: `"<configId>:<endpointId>:<k1=v1&k2=v2...>"`.
///
/// Parameter keys are lexicographically sorted (the `BTreeMap` order), so
/// logically-identical requests always map to the same key regardless of
/// insertion order.
pub fn cache_key(config_id: &str, endpoint_id: &str, params: &BTreeMap<String, Value>) -> String {
    let sorted: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", stringify(v)))
        .collect();
    format!("{config_id}:{endpoint_id}:{}", sorted.join("&"))
}

/// Sizing and sweep settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// How many of the oldest entries to drop per eviction pass.
    pub evict_batch: usize,
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            evict_batch: 10,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    ttl: Duration,
    endpoint_id: String,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// TTL-keyed map with expiry-on-read and capacity-bounded eviction.
pub struct CacheStore<T: Clone + Send + Sync + 'static> {
    entries: DashMap<String, CacheEntry<T>>,
    config: CacheConfig,
}

impl<T: Clone + Send + Sync + 'static> CacheStore<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Fetch a valid entry; expired entries are deleted as a side effect.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.data.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Insert or overwrite; evicts the oldest entries when over capacity.
    pub fn set(&self, key: String, data: T, ttl: Duration, endpoint_id: String) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                stored_at: Instant::now(),
                ttl,
                endpoint_id,
            },
        );

        while self.entries.len() > self.config.max_entries {
            self.evict_oldest();
        }
    }

    /// Remove entries for one endpoint, or everything. Returns the count
    /// removed.
    pub fn clear(&self, endpoint_id: Option<&str>) -> usize {
        match endpoint_id {
            None => {
                let removed = self.entries.len();
                self.entries.clear();
                removed
            }
            Some(id) => {
                let keys: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|entry| entry.endpoint_id == id)
                    .map(|entry| entry.key().clone())
                    .collect();
                let removed = keys.len();
                for key in keys {
                    self.entries.remove(&key);
                }
                removed
            }
        }
    }

    /// Drop every expired entry, regardless of read activity.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the `evict_batch` entries with the oldest `stored_at`.
    fn evict_oldest(&self) {
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        for (key, _) in by_age.into_iter().take(self.config.evict_batch.max(1)) {
            self.entries.remove(&key);
        }
    }

    /// Spawn the periodic sweep task. Runs until `cancel` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let interval = cache.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            debug!(removed, "cache sweep purged expired entries");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store(max_entries: usize, evict_batch: usize) -> CacheStore<u32> {
        CacheStore::new(CacheConfig {
            max_entries,
            evict_batch,
            sweep_interval: Duration::from_secs(60),
        })
    }

    #[test]
    fn key_is_deterministic_regardless_of_insertion_order() {
        let mut p1 = BTreeMap::new();
        p1.insert("pair".to_owned(), json!("BTC-USD"));
        p1.insert("depth".to_owned(), json!(10));

        let mut p2 = BTreeMap::new();
        p2.insert("depth".to_owned(), json!(10));
        p2.insert("pair".to_owned(), json!("BTC-USD"));

        assert_eq!(
            cache_key("lens", "ticker", &p1),
            cache_key("lens", "ticker", &p2)
        );
        assert_eq!(cache_key("lens", "ticker", &p1), "lens:ticker:depth=10&pair=BTC-USD");
    }

    #[test]
    fn key_with_no_params_has_empty_tail() {
        assert_eq!(cache_key("lens", "balances", &BTreeMap::new()), "lens:balances:");
    }

    #[tokio::test(start_paused = true)]
    async fn hit_before_ttl_miss_after() {
        let cache = store(50, 10);
        cache.set("k".into(), 7, Duration::from_millis(10_000), "ticker".into());

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(cache.get("k"), None);
        // Expired entry was removed by the read.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn over_capacity_evicts_oldest_batch() {
        let cache = store(5, 2);
        for i in 0..5u32 {
            cache.set(format!("k{i}"), i, Duration::from_secs(60), "e".into());
            tokio::time::advance(Duration::from_millis(1)).await;
        }
        cache.set("k5".into(), 5, Duration::from_secs(60), "e".into());

        // 6 entries > max 5: the 2 oldest go.
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get("k0"), None);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k5"), Some(5));
    }

    #[tokio::test]
    async fn clear_scoped_to_endpoint() {
        let cache = store(50, 10);
        cache.set("a:1".into(), 1, Duration::from_secs(60), "ticker".into());
        cache.set("a:2".into(), 2, Duration::from_secs(60), "ticker".into());
        cache.set("b:1".into(), 3, Duration::from_secs(60), "trades".into());

        assert_eq!(cache.clear(Some("ticker")), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(None), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = store(50, 10);
        cache.set("short".into(), 1, Duration::from_millis(100), "e".into());
        cache.set("long".into(), 2, Duration::from_secs(600), "e".into());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_on_cancel() {
        let cache = Arc::new(store(50, 10));
        let cancel = CancellationToken::new();
        let handle = cache.spawn_sweeper(cancel.clone());

        cancel.cancel();
        handle.await.unwrap();
    }
}
