//! Error types for sqlmason

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sqlmason operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for statement building and execution
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Invalid builder or pool configuration (empty table name, no SET/VALUES
    /// data, pool parameter out of range)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Dialect name not recognized by the grammar lookup
    #[error("Unsupported database dialect: {0}")]
    UnsupportedDialect(String),

    /// INSERT rows with differing column sets or order
    #[error("Row shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An execute/fetch method was invoked on a builder with no attached executor
    #[error("No executor attached to this builder")]
    MissingExecutor,

    /// Pool could not hand out a connection within the acquire timeout
    #[error("Unable to acquire a connection within {0:?}")]
    PoolTimeout(Duration),

    /// Pool has been closed
    #[error("Connection pool is closed")]
    PoolClosed,

    /// Underlying driver failure, carrying the original message and code
    #[error("Driver error: {message}")]
    Driver {
        message: String,
        code: Option<String>,
    },

    /// Serialization error (cache payloads, bind-value fingerprints)
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QueryError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a shape-mismatch error
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch(message.into())
    }

    /// Create a driver error without a driver-specific code
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            code: None,
        }
    }

    /// Create a driver error carrying the original driver code
    pub fn driver_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Check if this is a pool timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::PoolTimeout(_))
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a driver error
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
