// patterns/cache.rs
use super::matcher::{Matcher, MatcherOptions};
use crate::error::GlobError;
use lru::LruCache;
use once_cell::sync::Lazy;
use std::{
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
};

// Limit cache size to prevent uncontrolled memory growth
const MAX_CACHE_SIZE: usize = 1000;

type Key = (String, MatcherOptions);

/// Metrics for cache performance monitoring
#[derive(Clone, Debug, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheMetrics {
    /// Calculates the cache hit ratio
    pub fn hit_ratio(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// Compiled matchers keyed by pattern and options
///
/// Compilation is pure, so entries never expire; the LRU bound only caps
/// memory.
struct MatcherCache {
    cache: Mutex<LruCache<Key, Matcher>>,
    metrics: Mutex<CacheMetrics>,
}

impl MatcherCache {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            metrics: Mutex::new(CacheMetrics::default()),
        }
    }

    fn get(&self, key: &Key) -> Option<Matcher> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);

        match cache.get(key) {
            Some(m) => {
                metrics.hits += 1;
                Some(m.clone())
            }
            None => {
                metrics.misses += 1;
                None
            }
        }
    }

    fn put(&self, key: Key, value: Matcher) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);

        cache.put(key, value);
        metrics.size = cache.len();
    }

    fn metrics(&self) -> CacheMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);

        cache.clear();
        metrics.size = 0;
    }
}

static MATCHER_CACHE: Lazy<MatcherCache> = Lazy::new(|| MatcherCache::new(MAX_CACHE_SIZE));

/// Retrieves a compiled matcher from cache or compiles and caches it
pub fn get_or_compile(pattern: &str, options: &MatcherOptions) -> Result<Matcher, GlobError> {
    let key = (pattern.to_string(), *options);
    if let Some(cached) = MATCHER_CACHE.get(&key) {
        return Ok(cached);
    }

    // Compiled outside the lock, a concurrent duplicate compile is harmless
    let matcher = Matcher::compile(pattern, options)?;
    MATCHER_CACHE.put(key, matcher.clone());
    Ok(matcher)
}

/// Returns metrics for the matcher cache
pub fn cache_metrics() -> CacheMetrics {
    MATCHER_CACHE.metrics()
}

/// Clears the matcher cache
pub fn clear_cache() {
    MATCHER_CACHE.clear();
}
