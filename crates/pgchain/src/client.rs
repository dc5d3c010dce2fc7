//! Generic client trait for unified database access.
//!
//! Chain execution methods accept anything implementing
//! [`GenericClient`], so the same chain runs against a direct
//! connection, a transaction or a pooled client.

use crate::error::{ChainError, ChainResult};
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
///
/// This allows chain execution to accept either a direct client
/// connection or a transaction, making it easy to compose statements
/// within transactions.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`ChainError::NotFound`]
    /// - 1+ rows: returns the first row (does **not** error)
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Row>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Option<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        let rows = GenericClient::query(self, sql, params).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ChainError::not_found("Expected one row, got none"))
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        let rows = GenericClient::query(self, sql, params).await?;
        Ok(rows.into_iter().next())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        let rows = GenericClient::query(self, sql, params).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ChainError::not_found("Expected one row, got none"))
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        let rows = GenericClient::query(self, sql, params).await?;
        Ok(rows.into_iter().next())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }
}

/// A stream of database rows.
///
/// This is a type-erased wrapper around a `Stream<Item = ChainResult<Row>>`
/// so that different client implementations can return a uniform
/// streaming type.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = ChainResult<Row>> + Send>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ChainResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = ChainResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Streaming query support.
///
/// This trait is intentionally separate from [`GenericClient`] so that
/// only clients that can efficiently stream rows (via `tokio-postgres`'s
/// `query_raw`) need to implement it.
pub trait StreamingClient: GenericClient {
    /// Execute a query and return a `RowStream` for incremental
    /// consumption.
    fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<RowStream>> + Send;
}

struct MapDbRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> MapDbRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for MapDbRowStream<S>
where
    S: Stream<Item = Result<Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = ChainResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(ChainError::from_db_error(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(ChainError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        let stream = tokio_postgres::Transaction::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(ChainError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        GenericClient::query(&**self, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        GenericClient::query_one(&**self, sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        GenericClient::query_opt(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        GenericClient::query_one(&**self, sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        GenericClient::query_opt(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        GenericClient::query_one(&**self, sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        GenericClient::query_opt(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Client {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::ClientWrapper {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Transaction<'_> {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

// ===== Reference implementations =====
// These allow wrappers to hold &Client instead of an owned Client.

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Row> {
        (*self).query_one(sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Option<Row>> {
        (*self).query_opt(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        (*self).execute(sql, params).await
    }
}

impl<C: StreamingClient> StreamingClient for &C {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        (*self).query_stream(sql, params).await
    }
}
