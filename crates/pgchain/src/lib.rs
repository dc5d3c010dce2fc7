//! pgchain: a fluent SQL statement builder for PostgreSQL.
//!
//! A chain accumulates clause fragments through consuming builder
//! calls and renders them on demand into a parameterized statement:
//! fragments are written with `?` input markers, and rendering emits
//! Postgres-style `$1..$n` positional parameters plus the matching
//! argument list.
//!
//! ```ignore
//! use pgchain::{ExpressionChain, asc, values};
//!
//! let (sql, args) = ExpressionChain::new()
//!     .select(&["id", "name"])
//!     .table("users")
//!     .and_where("age > ?", values![18])
//!     .order_by(&asc("name"))
//!     .limit(10)
//!     .render()?;
//!
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE age > $1 ORDER BY name ASC LIMIT 10"
//! );
//! # Ok::<(), pgchain::ChainError>(())
//! ```
//!
//! Arguments are [`Value`]s, which expand at attach time: a `Vec`
//! becomes one marker per element (`IN (?)` → `IN ($1, $2, $3)`), a
//! NULL is inlined as the literal `NULL`, and a nested chain splices in
//! as a parenthesized sub-query. Chains execute against anything
//! implementing [`GenericClient`], including `tokio_postgres` clients,
//! transactions and (with the `pool` feature) `deadpool_postgres`
//! clients.

pub mod chain;
pub mod client;
pub mod conflict;
pub mod error;
pub mod fields;
pub mod row;
pub mod segment;
pub mod value;

mod expand;
mod positional;

pub use chain::{ExpressionChain, asc, desc};
pub use client::{GenericClient, RowStream, StreamingClient};
pub use conflict::{Conflict, ConflictClause, ConflictTarget, ConflictUpdate};
pub use error::{ChainError, ChainResult};
pub use row::{FromRow, RowExt};
pub use value::Value;
