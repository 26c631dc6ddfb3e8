//! YAML settings for a bridge deployment: which engine, how to reach it
//! and how long cached results live.

mod types;
mod validation;

pub use types::*;

use std::path::Path;
use std::sync::Arc;

use crate::cache::{CacheProvider, MemoryCache};
use crate::core::traits::{ConnectionFactory, DialectId};
use crate::database::Database;
use crate::error::Result;

impl Settings {
    /// Read and validate settings from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate settings from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    pub fn dialect_id(&self) -> Result<DialectId> {
        DialectId::from_name(&self.database.dialect)
    }

    /// Build the database handle using `factory` for connections.
    pub fn database(&self, factory: Arc<dyn ConnectionFactory>) -> Result<Database> {
        Ok(Database::new(
            self.dialect_id()?,
            self.database.connection_string.clone(),
            factory,
        ))
    }

    /// Build the configured cache provider, if enabled.
    pub fn cache(&self) -> Option<Arc<dyn CacheProvider>> {
        if !self.cache.enabled {
            return None;
        }
        Some(Arc::new(MemoryCache::with_defaults(self.cache.entry_options())))
    }
}
