//! Error types for pgchain

use thiserror::Error;

/// Result type alias for pgchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Error types for chain construction, rendering and execution
#[derive(Debug, Error)]
pub enum ChainError {
    /// No main operation (select/insert/update/delete) was set on the chain
    #[error("chain has no main operation")]
    MissingOperation,

    /// The main operation requires a table name
    #[error("{0} requires a table")]
    MissingTable(&'static str),

    /// The number of `?` markers in the rendered SQL does not match the
    /// number of accumulated arguments
    #[error("placeholder mismatch: {markers} markers, {args} arguments")]
    PlaceholderMismatch { markers: usize, args: usize },

    /// RETURNING attached to an operation that cannot carry it
    #[error("RETURNING is not allowed on {0}")]
    ReturningNotAllowed(&'static str),

    /// A CTE sub-chain contains UNION segments, which WITH cannot nest
    #[error("CTE '{0}' contains a UNION; unions inside WITH clauses are not supported")]
    CteUnion(String),

    /// A deferred construction error recorded by a fluent call
    #[error("invalid chain construction: {0}")]
    Build(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl ChainError {
    /// Create a deferred construction error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific ChainError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ChainError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
