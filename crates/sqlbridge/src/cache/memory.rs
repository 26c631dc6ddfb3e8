//! In-process cache provider.
//!
//! Entries are stored as text with absolute and sliding expiry. Expired
//! entries are dropped lazily on read and by [`MemoryCache::purge_expired`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::directive::CacheEntryOptions;
use super::CacheProvider;
use crate::error::Result;

/// A cached text value with its expiry bookkeeping.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    created_at: Instant,
    last_access: Instant,
    options: CacheEntryOptions,
}

impl CacheEntry {
    fn new(value: String, options: CacheEntryOptions) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_access: now,
            options,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        let absolute = self
            .options
            .absolute_expiration
            .map_or(false, |ttl| now.duration_since(self.created_at) >= ttl);
        let sliding = self
            .options
            .sliding_expiration
            .map_or(false, |idle| now.duration_since(self.last_access) >= idle);
        absolute || sliding
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl MemoryCacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe in-memory [`CacheProvider`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Applied when a directive carries no expiration of its own.
    defaults: CacheEntryOptions,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Create a cache whose entries never expire unless the directive says so.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with a default absolute TTL.
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self::with_defaults(CacheEntryOptions::absolute(ttl))
    }

    /// Create a cache with default expiration options.
    pub fn with_defaults(defaults: CacheEntryOptions) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .map_or(false, |e| !e.is_expired(now))
    }

    pub fn stats(&self) -> MemoryCacheStats {
        MemoryCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let expired = match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_access = now;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.lookup(key);
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, options: &CacheEntryOptions) -> Result<()> {
        let options = if options.is_inherited() {
            self.defaults
        } else {
            *options
        };
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry::new(value, options));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);

        // Removing a missing key is not an error
        cache.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_absolute_expiration() {
        let cache = MemoryCache::new();
        let options = CacheEntryOptions::absolute(Duration::from_millis(20));
        cache.set("k", "v".to_string(), &options).await.unwrap();
        assert!(cache.contains("k"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::with_default_ttl(Duration::ZERO);
        cache
            .set("k", "v".to_string(), &CacheEntryOptions::inherit())
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_never_overrides_default_ttl() {
        let cache = MemoryCache::with_default_ttl(Duration::from_millis(10));
        cache
            .set("kept", "v".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();
        cache
            .set("default", "v".to_string(), &CacheEntryOptions::inherit())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("kept").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.get("default").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache
            .set("old", "1".to_string(), &CacheEntryOptions::absolute(Duration::ZERO))
            .await
            .unwrap();
        cache
            .set("new", "2".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = MemoryCache::new();
        cache.get("missing").await.unwrap();
        cache
            .set("k", "v".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();
        cache.get("k").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
