//! Configuration validation.

use super::Settings;
use crate::core::traits::DialectId;
use crate::error::{BridgeError, Result};

/// Validate the configuration.
pub fn validate(settings: &Settings) -> Result<()> {
    if settings.database.dialect.trim().is_empty() {
        return Err(BridgeError::Config("database.dialect is required".into()));
    }
    DialectId::from_name(&settings.database.dialect)?;

    if settings.database.connection_string.trim().is_empty() {
        return Err(BridgeError::Config(
            "database.connection_string is required".into(),
        ));
    }

    if settings.cache.enabled && settings.cache.default_ttl_secs == 0 {
        return Err(BridgeError::Config(
            "cache.default_ttl_secs must be at least 1".into(),
        ));
    }

    Ok(())
}
