use crate::scrapers::wikipedia::normalize_title;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// In-memory response cache
///
/// Entries are stored as JSON bytes and expire after a fixed TTL. Lookups
/// are counted so `/api/cache/stats` can report a hit rate.
pub struct CacheManager {
    cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
    max_capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            cache,
            ttl_secs,
            max_capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a value from cache
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.cache.get(key).await {
            Some(bytes) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Cache hit: {}", key);
                Ok(serde_json::from_slice(&bytes)?)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Cache miss: {}", key);
                Err(CacheError::CacheMiss(key.to_string()))
            }
        }
    }

    /// Set a value in cache
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.cache.insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a single entry
    pub async fn delete(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Drop every entry and reset the counters
    pub async fn clear(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        let removed = self.cache.entry_count();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::debug!("Cleared {} cache entries", removed);
        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        // entry_count is only exact once pending maintenance has run
        self.cache.run_pending_tasks().await;

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            entries: self.cache.entry_count(),
            hits,
            misses,
            hit_rate: if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 },
            ttl_secs: self.ttl_secs,
            max_capacity: self.max_capacity,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a Wikipedia summary
    ///
    /// Keyed on the article title as requested upstream. Titles are
    /// case-sensitive after the first letter.
    pub fn wikipedia(query: &str, lang: &str) -> String {
        let title = normalize_title(query).unwrap_or_default();
        format!("wikipedia:{}:{}", lang.trim().to_ascii_lowercase(), title)
    }

    /// Build a cache key for page metadata
    pub fn metadata(url: &str) -> String {
        format!("metadata:{}", url.trim())
    }

    /// Build a cache key for a shortened URL
    pub fn shortlink(url: &str) -> String {
        format!("shortlink:{}", url.trim())
    }
}
