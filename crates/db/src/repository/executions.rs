//! Execution repository functions.
//!
//! `executions` is both the historical record of workflow runs and the job
//! queue itself: workers poll it for `pending` rows and claim them with a
//! conditional update rather than a row-level lock.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ExecutionRow, DbError};

/// Enqueue a new execution in `pending` status.
pub async fn enqueue(
    pool: &PgPool,
    workflow_id: Uuid,
    version_id: Uuid,
    inputs: serde_json::Value,
) -> Result<ExecutionRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        ExecutionRow,
        r#"
        INSERT INTO executions
            (id, workflow_id, version_id, status, inputs, outputs, error, worker_id,
             scheduled_at, retry_count, max_retries, started_at, completed_at, created_at)
        VALUES ($1, $2, $3, 'pending', $4, NULL, NULL, NULL, $5, 0, 3, NULL, NULL, $5)
        RETURNING
            id, workflow_id, version_id, status, inputs, outputs, error, worker_id,
            scheduled_at, retry_count, max_retries, started_at, completed_at, created_at
        "#,
        id,
        workflow_id,
        version_id,
        inputs,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Return up to `limit` `pending` executions, oldest-scheduled first.
pub async fn find_pending(pool: &PgPool, limit: i64) -> Result<Vec<ExecutionRow>, DbError> {
    let rows = sqlx::query_as!(
        ExecutionRow,
        r#"
        SELECT
            id, workflow_id, version_id, status, inputs, outputs, error, worker_id,
            scheduled_at, retry_count, max_retries, started_at, completed_at, created_at
        FROM executions
        WHERE status = 'pending'
        ORDER BY scheduled_at ASC
        LIMIT $1
        "#,
        limit,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Atomically transition a `pending` row to `running`, recording the
/// claiming worker and the start time.
///
/// Returns `Ok(None)` if the row was not `pending` when the update ran — a
/// competing worker already claimed it. This is the sole serialization point
/// across workers; callers must not assume row-level locks.
pub async fn claim(pool: &PgPool, id: Uuid, worker_id: &str) -> Result<Option<ExecutionRow>, DbError> {
    let row = sqlx::query_as!(
        ExecutionRow,
        r#"
        UPDATE executions
        SET status = 'running', worker_id = $2, started_at = $3
        WHERE id = $1 AND status = 'pending'
        RETURNING
            id, workflow_id, version_id, status, inputs, outputs, error, worker_id,
            scheduled_at, retry_count, max_retries, started_at, completed_at, created_at
        "#,
        id,
        worker_id,
        Utc::now(),
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Mark a `running` execution `success`, recording its derived outputs.
pub async fn mark_completed(pool: &PgPool, id: Uuid, outputs: serde_json::Value) -> Result<(), DbError> {
    sqlx::query!(
        r#"
        UPDATE executions
        SET status = 'success', outputs = $2, completed_at = $3
        WHERE id = $1
        "#,
        id,
        outputs,
        Utc::now(),
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a `running` execution `error`, recording the human-readable message.
///
/// `retry_count`/`max_retries` are not touched here — no retry policy runs
/// against them yet.
pub async fn mark_failed(pool: &PgPool, id: Uuid, error_message: &str) -> Result<(), DbError> {
    sqlx::query!(
        r#"
        UPDATE executions
        SET status = 'error', error = $2, completed_at = $3
        WHERE id = $1
        "#,
        id,
        error_message,
        Utc::now(),
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a single execution by its primary key.
pub async fn get_execution(pool: &PgPool, id: Uuid) -> Result<ExecutionRow, DbError> {
    let row = sqlx::query_as!(
        ExecutionRow,
        r#"
        SELECT
            id, workflow_id, version_id, status, inputs, outputs, error, worker_id,
            scheduled_at, retry_count, max_retries, started_at, completed_at, created_at
        FROM executions
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
