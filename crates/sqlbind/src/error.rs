//! Error types for sqlbind

use thiserror::Error;

/// Result type alias for sqlbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for query building and execution.
///
/// Configuration errors (builder misuse) are raised at call or generation time,
/// before any SQL reaches the driver, and are fixed by changing the builder
/// call sequence. Execution errors come back from the driver unchanged, wrapped
/// in [`Error::Driver`] with the original error as `source`.
#[derive(Debug, Error)]
pub enum Error {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Comparison operator outside the fixed allow-list
    #[error("Operator '{0}' is not allowed")]
    UnsupportedOperator(String),

    /// Builder state cannot produce a statement (missing fields, empty rows, ...)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A join reached SQL generation without any ON clause
    #[error("Join on '{0}' has no ON clause")]
    JoinWithoutOn(String),

    /// `on()` was called before any `join()`
    #[error("on() requires a preceding join()")]
    OnWithoutJoin,

    /// Upsert requested against a driver with no supported conflict syntax
    #[error("Driver '{0}' has no supported upsert syntax")]
    UnsupportedDialect(String),

    /// Row input that is not a JSON object
    #[error("Row input must be a JSON object, got {0}")]
    InvalidRow(String),

    /// Row decode/hydration error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Error surfaced unchanged from the underlying database driver
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create an invalid-query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a driver error, preserving it as the source
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Driver(Box::new(err))
    }

    /// Check if this error was caused by builder misuse rather than the driver
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperator(_)
                | Self::InvalidQuery(_)
                | Self::JoinWithoutOn(_)
                | Self::OnWithoutJoin
                | Self::UnsupportedDialect(_)
                | Self::InvalidRow(_)
        )
    }

    /// Check if this is a driver-level execution error
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}
