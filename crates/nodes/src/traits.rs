//! The `ExecutableNode` trait — the contract every node must fulfil.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::NodeError;

/// A node's assembled port inputs, or the map of outputs it returns.
///
/// Values are untyped JSON — `IOSchema` declarations exist for editor and
/// validation purposes, but the runtime does not check them at execution
/// time (the source this is modelled on does not either).
pub type PortMap = HashMap<String, Value>;

/// Cooperative cancellation signal threaded through node execution.
///
/// The scheduler does not enforce per-node timeouts; a node implementation
/// that performs long-running I/O should poll `is_cancelled` and bail out
/// early once it flips.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Destination for the log lines and arbitrary JSON a node emits during
/// `run`.
///
/// Bound to the database by the worker; tests can supply an in-memory sink
/// instead. Implementations must be `Send + Sync` since a worker may run
/// several executions concurrently (see the concurrency model).
pub trait ExecutionLogSink: Send + Sync {
    /// A free-text log line, distinct from the scheduler's own
    /// `"[nodeId] Executing <type>"` / `"Completed"` lines.
    fn log(&self, node_id: &str, message: &str);

    /// Arbitrary JSON persisted against `(workflowId, executionId, nodeId)`.
    fn write_log(&self, node_id: &str, data: Value);
}

/// A sink that discards everything. Used in tests and wherever log
/// persistence is not wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogSink;

impl ExecutionLogSink for NullLogSink {
    fn log(&self, _node_id: &str, _message: &str) {}
    fn write_log(&self, _node_id: &str, _data: Value) {}
}

/// Shared context passed to every node during execution.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Clone)]
pub struct ExecutionContext {
    /// ID of the node currently executing.
    pub node_id: String,
    /// ID of the parent workflow, if the execution is tied to one.
    pub workflow_id: Option<uuid::Uuid>,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// A copy of the workflow-level inputs object.
    pub workflow_inputs: Value,
    /// Cooperative cancellation signal.
    pub cancellation: CancellationToken,
    sink: Arc<dyn ExecutionLogSink>,
}

impl ExecutionContext {
    pub fn new(
        node_id: impl Into<String>,
        workflow_id: Option<uuid::Uuid>,
        execution_id: uuid::Uuid,
        workflow_inputs: Value,
        cancellation: CancellationToken,
        sink: Arc<dyn ExecutionLogSink>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            workflow_id,
            execution_id,
            workflow_inputs,
            cancellation,
            sink,
        }
    }

    /// Append a free-text log line scoped to the current node.
    pub fn log(&self, message: impl Into<String>) {
        self.sink.log(&self.node_id, &message.into());
    }

    /// Persist arbitrary JSON scoped to the current node.
    pub fn write_log(&self, data: Value) {
        self.sink.write_log(&self.node_id, data);
    }
}

/// The core node trait.
///
/// All built-in nodes and external plug-ins must implement this. The engine
/// dispatches execution through this trait object; a throw (`Err`) aborts
/// the run.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node.
    ///
    /// `inputs` is the assembled port-input map (one entry per incoming
    /// edge); `params` is the fully resolved parameter map (static/secret/
    /// input references already substituted by the caller). The returned
    /// map must cover every declared output port — a missing port is
    /// treated as `undefined` by downstream consumers, not as an error.
    async fn run(
        &self,
        inputs: PortMap,
        params: HashMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError>;
}
