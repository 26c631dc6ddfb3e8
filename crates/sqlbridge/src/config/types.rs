//! Configuration type definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntryOptions;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Target database.
    pub database: DatabaseSettings,

    /// Query result cache.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Engine name (mysql, sqlserver, postgresql, oracle, sqlite or an alias).
    pub dialect: String,

    /// Driver connection string.
    pub connection_string: String,
}

/// In-memory cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Build a cache provider at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Expiration applied to entries stored without their own policy.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    /// Treat the TTL as an idle timeout instead of an absolute one.
    #[serde(default)]
    pub sliding: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: default_ttl_secs(),
            sliding: false,
        }
    }
}

impl CacheSettings {
    /// Entry options built from the TTL settings.
    pub fn entry_options(&self) -> CacheEntryOptions {
        let ttl = Duration::from_secs(self.default_ttl_secs);
        if self.sliding {
            CacheEntryOptions::sliding(ttl)
        } else {
            CacheEntryOptions::absolute(ttl)
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    300
}
