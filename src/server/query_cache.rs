/// Query cache module for generated SQL
///
/// Maps a raw natural-language query string to the SQL the model generated
/// for it. Identical phrasings recur across users; a hit skips both the
/// schema introspection round-trips and the model call.
///
/// # Keying
///
/// The key is the exact, unnormalized query text - no trimming, case folding,
/// or semantic deduplication. Trivially different phrasings of the same
/// intent are therefore cached separately (kept as-is deliberately, see the
/// raw-key test below).
///
/// # Eviction
///
/// Entries expire a fixed TTL after insertion (inserting again resets the
/// clock; reads do not extend it). A background task sweeps expired entries
/// every sweep interval; expired entries read as absent even before a sweep.
///
/// # Configuration
///
/// Environment variables:
/// - `GEOSEARCH_CACHE_TTL_SECS` (default: 600)
/// - `GEOSEARCH_CACHE_SWEEP_SECS` (default: 120)
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cached entry with its expiry deadline
#[derive(Debug, Clone)]
struct CacheEntry {
    sql: String,
    expires_at: Instant,
}

/// Configuration for the query cache
#[derive(Debug, Clone)]
pub struct QueryCacheConfig {
    /// Time-to-live for an entry, measured from insertion
    pub ttl: Duration,
    /// Interval between background sweeps of expired entries
    pub sweep_interval: Duration,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        QueryCacheConfig {
            ttl: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(120),
        }
    }
}

impl QueryCacheConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let ttl_secs = std::env::var("GEOSEARCH_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let sweep_secs = std::env::var("GEOSEARCH_CACHE_SWEEP_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        QueryCacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
        }
    }
}

/// TTL cache from raw query string to generated SQL
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    config: QueryCacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl QueryCache {
    /// Create a new query cache with configuration
    pub fn new(config: QueryCacheConfig) -> Self {
        QueryCache {
            entries: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a new query cache with default configuration
    pub fn with_defaults() -> Self {
        Self::new(QueryCacheConfig::default())
    }

    /// Create a new query cache from environment variables
    pub fn from_env() -> Self {
        Self::new(QueryCacheConfig::from_env())
    }

    pub fn sweep_interval(&self) -> Duration {
        self.config.sweep_interval
    }

    /// True if a live (non-expired) entry exists for `query`
    pub fn contains(&self, query: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(query)
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Get the cached SQL for `query`, if a live entry exists
    pub fn get(&self, query: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(query) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.sql.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite the entry for `query`, resetting its expiry clock
    pub fn insert(&self, query: &str, sql: &str) {
        let entry = CacheEntry {
            sql: sql.to_string(),
            expires_at: Instant::now() + self.config.ttl,
        };

        let mut entries = self.entries.lock().unwrap();
        entries.insert(query.to_string(), entry);
    }

    /// Drop the entry for `query`, if any
    pub fn remove(&self, query: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(query);
    }

    /// Evict expired entries; returns the number evicted
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let evicted = before - entries.len();
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    /// Get cache metrics
    pub fn metrics(&self) -> CacheMetrics {
        let entries = self.entries.lock().unwrap();

        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: entries.len(),
            ttl_secs: self.config.ttl.as_secs(),
            sweep_interval_secs: self.config.sweep_interval.as_secs(),
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl CacheMetrics {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_lived(ttl_ms: u64) -> QueryCache {
        QueryCache::new(QueryCacheConfig {
            ttl: Duration::from_millis(ttl_ms),
            sweep_interval: Duration::from_millis(ttl_ms),
        })
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = QueryCache::with_defaults();

        // Cache miss
        assert_eq!(cache.get("parks near me"), None);
        assert_eq!(cache.metrics().misses, 1);

        // Insert
        cache.insert("parks near me", "SELECT * FROM gis.parks");

        // Cache hit
        assert!(cache.contains("parks near me"));
        assert_eq!(
            cache.get("parks near me"),
            Some("SELECT * FROM gis.parks".to_string())
        );
        assert_eq!(cache.metrics().hits, 1);
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let cache = short_lived(30);
        cache.insert("parks near me", "SELECT 1");
        assert!(cache.contains("parks near me"));

        std::thread::sleep(Duration::from_millis(50));

        assert!(!cache.contains("parks near me"));
        assert_eq!(cache.get("parks near me"), None);
    }

    #[test]
    fn test_insert_resets_expiry_clock() {
        let cache = short_lived(60);
        cache.insert("parks near me", "SELECT 1");

        std::thread::sleep(Duration::from_millis(40));
        cache.insert("parks near me", "SELECT 2");
        std::thread::sleep(Duration::from_millis(40));

        // 80ms after the first insert, but only 40ms after the overwrite
        assert_eq!(cache.get("parks near me"), Some("SELECT 2".to_string()));
    }

    #[test]
    fn test_sweep_evicts_expired_entries() {
        let cache = short_lived(30);
        cache.insert("a", "SQL A");
        cache.insert("b", "SQL B");

        std::thread::sleep(Duration::from_millis(50));
        cache.insert("c", "SQL C");

        let evicted = cache.sweep();
        assert_eq!(evicted, 2);

        let metrics = cache.metrics();
        assert_eq!(metrics.evictions, 2);
        assert_eq!(metrics.size, 1);
    }

    #[test]
    fn test_remove_drops_entry() {
        let cache = QueryCache::with_defaults();
        cache.insert("parks near me", "SELECT 1");
        cache.remove("parks near me");
        assert!(!cache.contains("parks near me"));
    }

    /// Keys are the raw query text. Two phrasings with identical intent are
    /// cached independently - possibly unintentional upstream, preserved
    /// as-is rather than silently normalized.
    #[test]
    fn test_raw_keys_are_not_normalized() {
        let cache = QueryCache::with_defaults();
        cache.insert("roads near Nairobi", "SELECT 1");

        assert!(cache.contains("roads near Nairobi"));
        assert!(!cache.contains(" roads near nairobi "));
        assert!(!cache.contains("roads near nairobi"));
    }

    #[test]
    fn test_cache_metrics() {
        let cache = QueryCache::with_defaults();
        cache.insert("parks near me", "SELECT 1");
        cache.get("parks near me"); // hit
        cache.get("parks near me"); // hit
        cache.get("schools near me"); // miss

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 2);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 2.0 / 3.0);
        assert_eq!(metrics.size, 1);
    }

    #[test]
    fn test_config_defaults() {
        let config = QueryCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.sweep_interval, Duration::from_secs(120));
    }
}
