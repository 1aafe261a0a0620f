//! `queue` crate — the persistent execution queue.
//!
//! Wraps `db::repository::executions` with at-most-once claim semantics:
//! a conditional `pending -> running` update is the only mutator workers
//! contend on, and a lost race surfaces as [`QueueError::ClaimLost`] rather
//! than an error of the run itself.

pub mod error;

use db::models::ExecutionRow;
use db::DbPool;
use uuid::Uuid;

pub use error::QueueError;

/// Thin handle around the shared pool, scoping queue operations to the
/// `executions` table.
#[derive(Clone)]
pub struct Queue {
    pool: DbPool,
}

impl Queue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for repositories this crate doesn't wrap itself
    /// (e.g. workflow/version lookups, which belong to `db::repository::workflows`).
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Enqueue a new execution in `pending` status.
    pub async fn enqueue(
        &self,
        workflow_id: Uuid,
        version_id: Uuid,
        inputs: serde_json::Value,
    ) -> Result<ExecutionRow, QueueError> {
        Ok(db::repository::executions::enqueue(&self.pool, workflow_id, version_id, inputs).await?)
    }

    /// Return up to `limit` `pending` executions, oldest-scheduled first.
    pub async fn find_pending(&self, limit: i64) -> Result<Vec<ExecutionRow>, QueueError> {
        Ok(db::repository::executions::find_pending(&self.pool, limit).await?)
    }

    /// Claim a pending execution for `worker_id`.
    ///
    /// Translates a lost race (the row was not `pending` any more) into
    /// [`QueueError::ClaimLost`] rather than returning `Ok(None)`, so callers
    /// can match on the error type directly.
    pub async fn claim(&self, id: Uuid, worker_id: &str) -> Result<ExecutionRow, QueueError> {
        match db::repository::executions::claim(&self.pool, id, worker_id).await? {
            Some(row) => Ok(row),
            None => Err(QueueError::ClaimLost),
        }
    }

    /// Mark a claimed execution `success`, recording its derived outputs.
    pub async fn mark_completed(&self, id: Uuid, outputs: serde_json::Value) -> Result<(), QueueError> {
        Ok(db::repository::executions::mark_completed(&self.pool, id, outputs).await?)
    }

    /// Mark a claimed execution `error`, recording the failure message.
    pub async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), QueueError> {
        Ok(db::repository::executions::mark_failed(&self.pool, id, error_message).await?)
    }

    /// Append one execution log entry.
    pub async fn write_log(
        &self,
        workflow_id: Uuid,
        execution_id: Uuid,
        node_id: &str,
        data: serde_json::Value,
    ) -> Result<(), QueueError> {
        db::repository::logs::create(&self.pool, workflow_id, execution_id, node_id, data).await?;
        Ok(())
    }

    /// Fetch every log entry for an execution, in write order.
    pub async fn logs_for_execution(&self, execution_id: Uuid) -> Result<Vec<db::models::ExecutionLogRow>, QueueError> {
        Ok(db::repository::logs::list_for_execution(&self.pool, execution_id).await?)
    }
}
