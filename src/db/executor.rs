//! Statement execution on a single owned connection.
//!
//! Every invocation owns exactly one [`PgExecutor`]; it runs the invocation's
//! statement(s) and is closed before the response is returned. Each statement
//! is bounded by the configured query timeout.

use crate::db::params::{bind_postgres_param, bind_postgres_param_as};
use crate::error::{AppError, AppResult};
use crate::models::{RowRecord, Statement};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Postgres};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Runs statements against one open database connection.
pub trait StatementExecutor: Send {
    /// Execute a statement that returns no rows; yields rows affected.
    fn execute(&mut self, statement: &Statement) -> impl Future<Output = AppResult<u64>> + Send;

    /// Execute statements in one transaction: all of them commit or none do.
    /// Yields the total rows affected.
    fn execute_batch(
        &mut self,
        statements: &[Statement],
    ) -> impl Future<Output = AppResult<u64>> + Send;

    /// Execute a statement returning `sampleapp_table` rows.
    fn fetch_records(
        &mut self,
        statement: &Statement,
    ) -> impl Future<Output = AppResult<Vec<RowRecord>>> + Send;

    /// Close the connection, ending the invocation's use of it.
    fn close(self) -> impl Future<Output = AppResult<()>> + Send;
}

/// PostgreSQL connection with a per-statement timeout.
#[derive(Debug)]
pub struct PgExecutor {
    conn: PgConnection,
    query_timeout: Duration,
}

impl PgExecutor {
    pub fn new(conn: PgConnection, query_timeout: Duration) -> Self {
        Self {
            conn,
            query_timeout,
        }
    }
}

impl StatementExecutor for PgExecutor {
    async fn execute(&mut self, statement: &Statement) -> AppResult<u64> {
        let start = Instant::now();
        debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "Executing statement"
        );

        let query = bound_query(statement);
        let rows_affected = match timeout(self.query_timeout, query.execute(&mut self.conn)).await
        {
            Ok(Ok(result)) => result.rows_affected(),
            Ok(Err(e)) => return Err(AppError::from(e)),
            Err(_) => return Err(timeout_error("statement execution", self.query_timeout)),
        };

        debug!(
            rows_affected,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Statement complete"
        );
        Ok(rows_affected)
    }

    async fn execute_batch(&mut self, statements: &[Statement]) -> AppResult<u64> {
        let start = Instant::now();
        let mut tx = self.conn.begin().await?;

        let mut rows_affected = 0;
        for statement in statements {
            debug!(sql = %statement.sql, "Executing batch statement");
            // Returning early drops `tx`, which rolls it back.
            match timeout(self.query_timeout, bound_query(statement).execute(&mut *tx)).await {
                Ok(Ok(result)) => rows_affected += result.rows_affected(),
                Ok(Err(e)) => return Err(AppError::from(e)),
                Err(_) => return Err(timeout_error("batch execution", self.query_timeout)),
            }
        }

        match timeout(self.query_timeout, tx.commit()).await {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error("commit", self.query_timeout)),
        }

        debug!(
            statements = statements.len(),
            rows_affected,
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Batch committed"
        );
        Ok(rows_affected)
    }

    async fn fetch_records(&mut self, statement: &Statement) -> AppResult<Vec<RowRecord>> {
        debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "Executing query"
        );

        let mut query = sqlx::query_as::<_, RowRecord>(statement.sql);
        for param in &statement.params {
            query = bind_postgres_param_as(query, param);
        }

        match timeout(self.query_timeout, query.fetch_all(&mut self.conn)).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => Err(AppError::from(e)),
            Err(_) => Err(timeout_error("query execution", self.query_timeout)),
        }
    }

    async fn close(self) -> AppResult<()> {
        self.conn.close().await.map_err(AppError::from)
    }
}

fn bound_query(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(statement.sql);
    for param in &statement.params {
        query = bind_postgres_param(query, param);
    }
    query
}

pub(crate) fn timeout_error(operation: &str, limit: Duration) -> AppError {
    AppError::query(
        format!("{} exceeded {}s", operation, limit.as_secs()),
        None,
    )
}
