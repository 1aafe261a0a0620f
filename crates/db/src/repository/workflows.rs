//! Workflow and workflow-version CRUD operations.
//!
//! Workflows and versions are immutable after creation except for
//! `workflows.current_version_id`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{WorkflowRow, WorkflowVersionRow},
    DbError,
};

/// Create a workflow together with its first version, atomically.
///
/// `definition` must be a valid `WorkflowDsl` JSON object produced by the
/// `engine` crate. The new workflow's `current_version_id` points at the
/// version created here.
pub async fn create_workflow(
    pool: &PgPool,
    name: &str,
    dsl_version: &str,
    definition: serde_json::Value,
) -> Result<(WorkflowRow, WorkflowVersionRow), DbError> {
    let mut tx = pool.begin().await?;

    let workflow_id = Uuid::new_v4();
    let version_id = Uuid::new_v4();
    let now = Utc::now();

    let version = sqlx::query_as!(
        WorkflowVersionRow,
        r#"
        INSERT INTO workflow_versions (id, workflow_id, dsl_version, definition, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, workflow_id, dsl_version, definition, created_at
        "#,
        version_id,
        workflow_id,
        dsl_version,
        definition,
        now,
    )
    .fetch_one(&mut *tx)
    .await?;

    let workflow = sqlx::query_as!(
        WorkflowRow,
        r#"
        INSERT INTO workflows (id, name, current_version_id, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, current_version_id, created_at
        "#,
        workflow_id,
        name,
        version_id,
        now,
    )
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((workflow, version))
}

/// Append a new immutable version to an existing workflow.
///
/// Does not move `current_version_id` — callers must call
/// [`set_current_version`] explicitly once the new version is ready to serve.
pub async fn create_version(
    pool: &PgPool,
    workflow_id: Uuid,
    dsl_version: &str,
    definition: serde_json::Value,
) -> Result<WorkflowVersionRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        WorkflowVersionRow,
        r#"
        INSERT INTO workflow_versions (id, workflow_id, dsl_version, definition, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, workflow_id, dsl_version, definition, created_at
        "#,
        id,
        workflow_id,
        dsl_version,
        definition,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Point `workflows.current_version_id` at an already-created version.
pub async fn set_current_version(pool: &PgPool, workflow_id: Uuid, version_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query!(
        "UPDATE workflows SET current_version_id = $1 WHERE id = $2",
        version_id,
        workflow_id,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetch a single workflow by its primary key.
pub async fn get_workflow(pool: &PgPool, id: Uuid) -> Result<WorkflowRow, DbError> {
    let row = sqlx::query_as!(
        WorkflowRow,
        r#"SELECT id, name, current_version_id, created_at FROM workflows WHERE id = $1"#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Return all workflows ordered by creation time (newest first).
pub async fn list_workflows(pool: &PgPool) -> Result<Vec<WorkflowRow>, DbError> {
    let rows = sqlx::query_as!(
        WorkflowRow,
        r#"SELECT id, name, current_version_id, created_at FROM workflows ORDER BY created_at DESC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch a single version by its primary key.
pub async fn get_version(pool: &PgPool, id: Uuid) -> Result<WorkflowVersionRow, DbError> {
    let row = sqlx::query_as!(
        WorkflowVersionRow,
        r#"SELECT id, workflow_id, dsl_version, definition, created_at FROM workflow_versions WHERE id = $1"#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Return every version of a workflow, oldest first.
pub async fn list_versions(pool: &PgPool, workflow_id: Uuid) -> Result<Vec<WorkflowVersionRow>, DbError> {
    let rows = sqlx::query_as!(
        WorkflowVersionRow,
        r#"
        SELECT id, workflow_id, dsl_version, definition, created_at
        FROM workflow_versions
        WHERE workflow_id = $1
        ORDER BY created_at ASC
        "#,
        workflow_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch a workflow's current version in one round trip.
pub async fn get_current_version(pool: &PgPool, workflow_id: Uuid) -> Result<WorkflowVersionRow, DbError> {
    let row = sqlx::query_as!(
        WorkflowVersionRow,
        r#"
        SELECT wv.id, wv.workflow_id, wv.dsl_version, wv.definition, wv.created_at
        FROM workflow_versions wv
        JOIN workflows w ON w.current_version_id = wv.id
        WHERE w.id = $1
        "#,
        workflow_id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Permanently delete a workflow (and, via `ON DELETE CASCADE`, its versions
/// and executions) by its primary key.
///
/// Returns `DbError::NotFound` if no row was deleted.
pub async fn delete_workflow(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query!("DELETE FROM workflows WHERE id = $1", id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
