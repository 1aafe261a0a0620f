//! Execution log repository functions.
//!
//! Logs are append-only; ordering is by `created_at` then insertion id,
//! matching the order nodes actually executed within a run.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ExecutionLogRow, DbError};

/// Append one log entry scoped to `(workflow_id, execution_id, node_id)`.
pub async fn create(
    pool: &PgPool,
    workflow_id: Uuid,
    execution_id: Uuid,
    node_id: &str,
    data: serde_json::Value,
) -> Result<ExecutionLogRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        ExecutionLogRow,
        r#"
        INSERT INTO execution_logs (id, workflow_id, execution_id, node_id, data, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, workflow_id, execution_id, node_id, data, created_at
        "#,
        id,
        workflow_id,
        execution_id,
        node_id,
        data,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Return every log entry for an execution, in the order they were written.
pub async fn list_for_execution(pool: &PgPool, execution_id: Uuid) -> Result<Vec<ExecutionLogRow>, DbError> {
    let rows = sqlx::query_as!(
        ExecutionLogRow,
        r#"
        SELECT id, workflow_id, execution_id, node_id, data, created_at
        FROM execution_logs
        WHERE execution_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
        execution_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
