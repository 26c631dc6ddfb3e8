//! Cache integration for queries.
//!
//! A [`CachingDirective`] rides on a `Query` and is stripped before
//! compilation by [`prepare`]. Invalidate directives remove their key at
//! that point, before the statement runs. ReadThrough directives are
//! handed back to the caller, which wraps execution in [`read_through`].
//!
//! Values are stored as text: scalars use their display form and composite
//! results are JSON (see [`CacheValue`] and [`Json`]).

mod directive;
mod memory;

pub use directive::{CacheAction, CacheEntryOptions, CachingDirective};
pub use memory::{MemoryCache, MemoryCacheStats};

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::query::Query;

/// Key-value cache capability supplied by the application.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, options: &CacheEntryOptions) -> Result<()>;

    /// Remove a key; removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Text encoding of a cacheable result.
pub trait CacheValue: Sized {
    /// Encode for storage; `None` means the value is not cached (null results).
    fn encode(&self) -> Result<Option<String>>;

    fn decode(text: &str) -> Result<Self>;
}

impl CacheValue for bool {
    fn encode(&self) -> Result<Option<String>> {
        Ok(Some(self.to_string()))
    }

    fn decode(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(BridgeError::Cache(format!("not a boolean: {:?}", other))),
        }
    }
}

impl CacheValue for i64 {
    fn encode(&self) -> Result<Option<String>> {
        Ok(Some(self.to_string()))
    }

    fn decode(text: &str) -> Result<Self> {
        text.trim()
            .parse()
            .map_err(|e| BridgeError::Cache(format!("not an integer: {:?} ({})", text, e)))
    }
}

impl CacheValue for u64 {
    fn encode(&self) -> Result<Option<String>> {
        Ok(Some(self.to_string()))
    }

    fn decode(text: &str) -> Result<Self> {
        text.trim()
            .parse()
            .map_err(|e| BridgeError::Cache(format!("not a count: {:?} ({})", text, e)))
    }
}

impl CacheValue for Option<i64> {
    fn encode(&self) -> Result<Option<String>> {
        Ok(self.map(|v| v.to_string()))
    }

    fn decode(text: &str) -> Result<Self> {
        i64::decode(text).map(Some)
    }
}

impl CacheValue for String {
    fn encode(&self) -> Result<Option<String>> {
        Ok(Some(self.clone()))
    }

    fn decode(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

/// Composite result stored as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> CacheValue for Json<T> {
    fn encode(&self) -> Result<Option<String>> {
        let value = serde_json::to_value(&self.0)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::to_string(&value)?))
    }

    fn decode(text: &str) -> Result<Self> {
        Ok(Json(serde_json::from_str(text)?))
    }
}

/// Strip the directive from a query before compilation.
///
/// An Invalidate directive removes its key right away, whether or not the
/// statement later succeeds, and is not returned. A ReadThrough directive
/// is returned for [`read_through`].
pub async fn prepare(
    cache: Option<&dyn CacheProvider>,
    query: Query,
) -> Result<(Query, Option<CachingDirective>)> {
    let (query, directive) = query.take_caching();
    match directive {
        Some(d) if d.action == CacheAction::Invalidate => {
            if let Some(cache) = cache {
                cache.remove(&d.key).await?;
                debug!("Invalidated cache key {}", d.key);
            }
            Ok((query, None))
        }
        other => Ok((query, other)),
    }
}

/// Serve `load` through the cache when a ReadThrough directive is present.
///
/// On a hit the stored value is decoded and returned without calling
/// `load`. On a miss (or an undecodable entry) `load` runs and its result
/// is stored with the directive's expiration. The store is a separate step
/// from the load, so a concurrent writer can leave a briefly stale entry.
pub async fn read_through<V, F, Fut>(
    cache: Option<&dyn CacheProvider>,
    directive: Option<&CachingDirective>,
    load: F,
) -> Result<V>
where
    V: CacheValue,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let (cache, directive) = match (cache, directive) {
        (Some(c), Some(d)) if d.action == CacheAction::ReadThrough => (c, d),
        _ => return load().await,
    };

    if let Some(text) = cache.get(&directive.key).await? {
        match V::decode(&text) {
            Ok(value) => {
                debug!("Cache hit for {}", directive.key);
                return Ok(value);
            }
            Err(e) => warn!("Discarding undecodable cache entry {}: {}", directive.key, e),
        }
    }

    let value = load().await?;
    if let Some(text) = value.encode()? {
        cache.set(&directive.key, text, &directive.options).await?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_scalar_codecs() {
        assert_eq!(true.encode().unwrap().as_deref(), Some("true"));
        assert!(bool::decode("1").unwrap());
        assert_eq!(i64::decode(" 42 ").unwrap(), 42);
        assert!(i64::decode("forty").is_err());
        assert_eq!(Option::<i64>::None.encode().unwrap(), None);
        assert_eq!(Option::<i64>::decode("9").unwrap(), Some(9));
    }

    #[test]
    fn test_json_codec_skips_null() {
        let none: Json<Option<Vec<i32>>> = Json(None);
        assert_eq!(none.encode().unwrap(), None);

        let some = Json(vec![1, 2, 3]);
        let text = some.encode().unwrap().unwrap();
        assert_eq!(text, "[1,2,3]");
        assert_eq!(Json::<Vec<i32>>::decode(&text).unwrap(), some);
    }

    #[tokio::test]
    async fn test_read_through_loads_once() {
        let cache = MemoryCache::new();
        let directive = CachingDirective::read_through("count", CacheEntryOptions::never());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: i64 = read_through(Some(&cache), Some(&directive), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
            assert_eq!(value, 5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_without_cache_always_loads() {
        let directive = CachingDirective::read_through("count", CacheEntryOptions::never());
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let _: i64 = read_through(None, Some(&directive), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_reloaded() {
        let cache = MemoryCache::new();
        cache
            .set("n", "garbage".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();
        let directive = CachingDirective::read_through("n", CacheEntryOptions::never());

        let value: i64 = read_through(Some(&cache), Some(&directive), || async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(cache.get("n").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_prepare_invalidates_immediately() {
        let cache = MemoryCache::new();
        cache
            .set("posts", "[]".to_string(), &CacheEntryOptions::never())
            .await
            .unwrap();

        let query = Query::table("Posts").caching_invalidate("posts");
        let (query, directive) = prepare(Some(&cache), query).await.unwrap();

        assert!(directive.is_none());
        assert!(query.caching().is_none());
        assert!(!cache.contains("posts"));
    }

    #[tokio::test]
    async fn test_prepare_returns_read_through() {
        let query = Query::table("Posts").caching_read_through("posts", CacheEntryOptions::never());
        let (query, directive) = prepare(None, query).await.unwrap();
        assert!(query.caching().is_none());
        assert_eq!(directive.unwrap().action, CacheAction::ReadThrough);
    }
}
