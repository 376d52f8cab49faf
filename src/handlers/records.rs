//! Record operations: one connection, one statement, then close.

use crate::db::statements;
use crate::db::{Connector, StatementExecutor};
use crate::error::AppResult;
use crate::models::{FlagUpdate, RowRecord, UpdateOutcome};
use tracing::{info, warn};

/// All rows, ordered by id.
pub async fn list_records<C: Connector>(connector: &C) -> AppResult<Vec<RowRecord>> {
    let mut conn = connector.connect().await?;
    let result = conn.fetch_records(&statements::select_all()).await;
    release(conn).await;

    let rows = result?;
    info!(count = rows.len(), "Listed records");
    Ok(rows)
}

/// One row by primary key, or `None` when absent.
pub async fn get_record<C: Connector>(connector: &C, id: i32) -> AppResult<Option<RowRecord>> {
    let mut conn = connector.connect().await?;
    let result = conn.fetch_records(&statements::select_by_id(id)).await;
    release(conn).await;

    Ok(result?.into_iter().next())
}

/// Set the five flags of one row.
pub async fn update_flags<C: Connector>(
    connector: &C,
    update: &FlagUpdate,
) -> AppResult<UpdateOutcome> {
    let mut conn = connector.connect().await?;
    let result = conn.execute(&statements::update_flags(update)).await;
    release(conn).await;

    let rows_affected = result?;
    info!(id = update.id, flags = ?update.flags, rows_affected, "Updated record flags");
    Ok(UpdateOutcome { rows_affected })
}

/// Drop, recreate, and seed `sampleapp_table` in one transaction.
///
/// A failure at any step leaves the previous table and its rows in place.
pub async fn bootstrap_table<C: Connector>(connector: &C) -> AppResult<()> {
    let mut conn = connector.connect().await?;
    let result = conn.execute_batch(&statements::bootstrap()).await;
    release(conn).await;

    result?;
    info!(table = statements::TABLE_NAME, "Bootstrapped table");
    Ok(())
}

/// Close the connection; a failed close does not change the outcome.
async fn release<E: StatementExecutor>(conn: E) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close database connection");
    }
}
