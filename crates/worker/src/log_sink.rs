//! `ExecutionLogSink` implementation bound to the persistent queue.
//!
//! `ExecutionLogSink`'s methods are synchronous (nodes call them inline
//! during `run`), so persistence happens on a detached task rather than
//! inline — a log write that loses its race with process shutdown is
//! acceptable; a node blocking on it is not.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use nodes::ExecutionLogSink;
use queue::Queue;

pub struct QueueLogSink {
    queue: Arc<Queue>,
    workflow_id: Uuid,
    execution_id: Uuid,
}

impl QueueLogSink {
    pub fn new(queue: Arc<Queue>, workflow_id: Uuid, execution_id: Uuid) -> Self {
        Self {
            queue,
            workflow_id,
            execution_id,
        }
    }

    fn spawn_persist(&self, node_id: &str, data: Value) {
        let queue = self.queue.clone();
        let workflow_id = self.workflow_id;
        let execution_id = self.execution_id;
        let node_id = node_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = queue.write_log(workflow_id, execution_id, &node_id, data).await {
                tracing::warn!(%execution_id, node_id, "failed to persist execution log: {e}");
            }
        });
    }
}

impl ExecutionLogSink for QueueLogSink {
    fn log(&self, node_id: &str, message: &str) {
        tracing::debug!(execution_id = %self.execution_id, node_id, "{message}");
        self.spawn_persist(node_id, json!({ "message": message }));
    }

    fn write_log(&self, node_id: &str, data: Value) {
        self.spawn_persist(node_id, data);
    }
}
