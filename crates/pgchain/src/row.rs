//! Row mapping traits and utilities

use crate::error::ChainResult;
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// Implement it by hand for the shapes your queries return:
///
/// ```ignore
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> ChainResult<Self> {
///         Ok(Self {
///             id: row.try_get_column("id")?,
///             username: row.try_get_column("username")?,
///             email: row.try_get_column("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> ChainResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning [`crate::ChainError::Decode`]
    /// on failure
    fn try_get_column<T>(&self, column: &str) -> ChainResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> ChainResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| crate::error::ChainError::decode(column, e.to_string()))
    }
}
