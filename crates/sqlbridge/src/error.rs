//! Error types for the data-access layer.
//!
//! Absence is not an error here: "row not found" is an `Option`, and
//! "table does not exist" is a `bool`. Only configuration mistakes and
//! driver failures surface as [`BridgeError`].

use thiserror::Error;

/// Main error type for repository, schema and compiler operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration error (invalid YAML, unknown dialect, bad identifier, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An aggregate was requested without a column to aggregate over.
    #[error("Aggregation target missing: {operation} requires exactly one selected column")]
    AggregationTargetMissing { operation: &'static str },

    /// Could not open a connection to the target database.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// The target engine rejected a statement.
    #[error("Driver error: {message}\n  Context: {context}")]
    Driver { message: String, context: String },

    /// A row value could not be decoded into an entity field.
    #[error("Decode error for column {column}: {message}")]
    Decode { column: String, message: String },

    /// Cache provider failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Reading a settings file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Extend payload or cached value could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl ToString, context: impl Into<String>) -> Self {
        BridgeError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Driver error with the statement or operation that failed
    pub fn driver(message: impl ToString, context: impl Into<String>) -> Self {
        BridgeError::Driver {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Decode error
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// True for caller mistakes that will fail the same way on every retry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BridgeError::Config(_) | BridgeError::AggregationTargetMissing { .. }
        )
    }

    /// Render the error followed by each underlying cause, one per line.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for data-access operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_error_is_configuration() {
        let err = BridgeError::AggregationTargetMissing { operation: "SUM" };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("SUM"));
    }

    #[test]
    fn test_driver_error_is_not_configuration() {
        let err = BridgeError::driver("syntax error near FROM", "SELECT * FROM");
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("syntax error"));
        assert!(err.to_string().contains("Context: SELECT * FROM"));
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "settings.yaml");
        let err = BridgeError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
    }
}
