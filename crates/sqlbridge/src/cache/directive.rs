//! Caching directives carried on a `Query`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with the cache key when the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheAction {
    /// Serve from the cache when present, otherwise execute and store.
    ReadThrough,
    /// Remove the key before the statement executes.
    Invalidate,
}

/// Expiration policy for a cache entry.
///
/// With neither expiration set and `persistent` off, the provider applies
/// its own defaults ([`CacheEntryOptions::inherit`]). `persistent` stores
/// the entry without any expiry ([`CacheEntryOptions::never`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntryOptions {
    /// Entry expires this long after it was stored.
    pub absolute_expiration: Option<Duration>,
    /// Entry expires when not read for this long.
    pub sliding_expiration: Option<Duration>,
    /// Keep the entry until it is removed, ignoring provider defaults.
    #[serde(default)]
    pub persistent: bool,
}

impl CacheEntryOptions {
    /// Expire a fixed time after storing.
    pub fn absolute(ttl: Duration) -> Self {
        Self {
            absolute_expiration: Some(ttl),
            ..Self::default()
        }
    }

    /// Expire after a period without reads.
    pub fn sliding(idle: Duration) -> Self {
        Self {
            sliding_expiration: Some(idle),
            ..Self::default()
        }
    }

    /// Use whatever expiration the provider is configured with.
    pub fn inherit() -> Self {
        Self::default()
    }

    /// No expiration, even when the provider has a default TTL.
    pub fn never() -> Self {
        Self {
            persistent: true,
            ..Self::default()
        }
    }

    /// Whether the provider's defaults apply.
    pub fn is_inherited(&self) -> bool {
        !self.persistent && self.absolute_expiration.is_none() && self.sliding_expiration.is_none()
    }
}

/// Caching metadata attached to a query. Never rendered into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachingDirective {
    pub action: CacheAction,
    pub key: String,
    pub options: CacheEntryOptions,
}

impl CachingDirective {
    pub fn read_through(key: impl Into<String>, options: CacheEntryOptions) -> Self {
        Self {
            action: CacheAction::ReadThrough,
            key: key.into(),
            options,
        }
    }

    pub fn invalidate(key: impl Into<String>) -> Self {
        Self {
            action: CacheAction::Invalidate,
            key: key.into(),
            options: CacheEntryOptions::default(),
        }
    }
}
