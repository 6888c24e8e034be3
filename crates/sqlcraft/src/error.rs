//! Error types for sqlcraft

use crate::statement::State;
use std::fmt;
use thiserror::Error;

/// Result type alias for sqlcraft operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Which row-count contract a result set broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityViolation {
    /// `NoDefault` policy and the statement produced no rows at all.
    NoRows,
    /// `Single` policy and a second row arrived.
    TooManyRows,
}

impl fmt::Display for CardinalityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRows => f.write_str("expected at least one row, got none"),
            Self::TooManyRows => f.write_str("expected at most one row, got more"),
        }
    }
}

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Operation is not valid in the statement's current clause state
    #[error("Protocol violation: `{operation}` is not allowed in state {state:?}")]
    ProtocolViolation {
        operation: &'static str,
        state: State,
    },

    /// Entity type or property has no resolvable column
    #[error("Unmapped schema: {0}")]
    UnmappedSchema(String),

    /// Data-source descriptor (or dialect feature) is not supported
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Value has no literal rendering
    #[error("Unrenderable value: {0}")]
    UnrenderableValue(String),

    /// Row-count contract was broken during execution
    #[error("Cardinality violation: {0}")]
    Cardinality(CardinalityViolation),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Opaque failure reported by a transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl OrmError {
    /// Create a protocol violation for `operation` attempted in `state`
    pub fn protocol(operation: &'static str, state: State) -> Self {
        tracing::trace!(target: "sqlcraft.protocol", operation, ?state, "rejected operation");
        Self::ProtocolViolation { operation, state }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an unmapped-schema error
    pub fn unmapped(message: impl Into<String>) -> Self {
        Self::UnmappedSchema(message.into())
    }

    /// Create an unrenderable-value error
    pub fn unrenderable(message: impl Into<String>) -> Self {
        Self::UnrenderableValue(message.into())
    }

    /// Check if this is a protocol violation
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Check if this is a "no rows" cardinality breach
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Cardinality(CardinalityViolation::NoRows))
    }

    /// Check if this is a "too many rows" cardinality breach
    pub fn is_too_many_rows(&self) -> bool {
        matches!(self, Self::Cardinality(CardinalityViolation::TooManyRows))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
