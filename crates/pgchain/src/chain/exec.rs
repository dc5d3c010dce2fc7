//! Execution: rendered chains against a [`GenericClient`].

use super::ExpressionChain;
use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::ChainResult;
use crate::row::FromRow;
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

fn param_refs(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl ExpressionChain {
    /// Render and execute, returning all rows.
    pub async fn query(&self, client: &impl GenericClient) -> ChainResult<Vec<Row>> {
        let (sql, args) = self.render()?;
        tracing::debug!(sql = %sql, params = args.len(), "executing chain");
        client.query(&sql, &param_refs(&args)).await
    }

    /// Render and execute, returning the first row.
    ///
    /// Returns [`crate::ChainError::NotFound`] on an empty result set.
    pub async fn query_one(&self, client: &impl GenericClient) -> ChainResult<Row> {
        let (sql, args) = self.render()?;
        tracing::debug!(sql = %sql, params = args.len(), "executing chain");
        client.query_one(&sql, &param_refs(&args)).await
    }

    /// Render and execute, returning the first row if any.
    pub async fn query_opt(&self, client: &impl GenericClient) -> ChainResult<Option<Row>> {
        let (sql, args) = self.render()?;
        tracing::debug!(sql = %sql, params = args.len(), "executing chain");
        client.query_opt(&sql, &param_refs(&args)).await
    }

    /// Render and execute, returning the affected row count.
    pub async fn execute(&self, client: &impl GenericClient) -> ChainResult<u64> {
        let (sql, args) = self.render()?;
        tracing::debug!(sql = %sql, params = args.len(), "executing chain");
        client.execute(&sql, &param_refs(&args)).await
    }

    /// Render, execute and map every row through [`FromRow`].
    pub async fn fetch_all<T: FromRow>(&self, client: &impl GenericClient) -> ChainResult<Vec<T>> {
        let rows = self.query(client).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Render, execute and map the first row through [`FromRow`].
    pub async fn fetch_one<T: FromRow>(&self, client: &impl GenericClient) -> ChainResult<T> {
        let row = self.query_one(client).await?;
        T::from_row(&row)
    }

    /// Render, execute and map the first row, if any, through
    /// [`FromRow`].
    pub async fn fetch_opt<T: FromRow>(
        &self,
        client: &impl GenericClient,
    ) -> ChainResult<Option<T>> {
        match self.query_opt(client).await? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Render and execute, returning a [`RowStream`] for incremental
    /// consumption of large result sets.
    pub async fn query_stream(&self, client: &impl StreamingClient) -> ChainResult<RowStream> {
        let (sql, args) = self.render()?;
        tracing::debug!(sql = %sql, params = args.len(), "streaming chain");
        client.query_stream(&sql, &param_refs(&args)).await
    }
}
