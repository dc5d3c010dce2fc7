//! SQL argument values.
//!
//! The expander has to look inside arguments (is this NULL? a slice? a
//! binary blob? a sub-query?) before the fragment text is frozen, so
//! arguments are modeled as a closed [`Value`] enum rather than boxed
//! `ToSql` trait objects. `Value` still implements `ToSql` by delegating
//! to the inner value, so a rendered argument list can be handed straight
//! to `tokio-postgres`.

use crate::chain::ExpressionChain;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, Utc};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// A SQL value that can be used as a statement argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 16-bit integer
    I16(i16),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Text value
    Text(String),
    /// Binary blob; always treated as a scalar, never expanded
    Bytes(Vec<u8>),
    /// UUID value
    Uuid(uuid::Uuid),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// Calendar date
    Date(NaiveDate),
    /// JSON value
    Json(serde_json::Value),
    /// List of values; a single `?` marker expands into one marker per element
    Array(Vec<Value>),
    /// Nested sub-query, rendered as a parenthesized sub-select
    Subquery(Box<ExpressionChain>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract array elements if this is an Array variant.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<ExpressionChain> for Value {
    fn from(chain: ExpressionChain) -> Self {
        Value::Subquery(Box::new(chain))
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<&[T]> for Value
where
    T: Clone + Into<Value>,
{
    fn from(vals: &[T]) -> Self {
        Value::Array(vals.iter().cloned().map(|v| v.into()).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I16(v) => v.to_sql(ty, out),
            Value::I32(v) => v.to_sql(ty, out),
            Value::I64(v) => v.to_sql(ty, out),
            Value::F32(v) => v.to_sql(ty, out),
            Value::F64(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::Array(v) => v.to_sql(ty, out),
            Value::Subquery(_) => {
                Err("sub-query values must be expanded before execution".into())
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The concrete inner type decides at encode time.
        true
    }

    to_sql_checked!();
}

/// Build a `Vec<Value>` from heterogeneous argument expressions.
///
/// # Example
/// ```ignore
/// let args = values![18, "alice", None::<i64>, vec![1_i64, 2, 3]];
/// ```
#[macro_export]
macro_rules! values {
    () => {
        Vec::<$crate::Value>::new()
    };
    ($($v:expr),+ $(,)?) => {
        vec![$($crate::Value::from($v)),+]
    };
}
