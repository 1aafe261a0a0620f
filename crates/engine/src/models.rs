//! Per-run in-memory state.
//!
//! [`ExecutionState`] is not persisted directly — the worker translates it
//! into `db::models::ExecutionRow` / `db::models::ExecutionLogRow` rows at
//! the boundaries of a run. See `engine::executor::WorkflowExecutor`.

use std::collections::HashMap;
use std::sync::Arc;

use nodes::PortMap;
use serde_json::Value;
use uuid::Uuid;

/// Callback invoked immediately before a node runs.
pub type OnNodeStart = Arc<dyn Fn(&str, &str) + Send + Sync>;
/// Callback invoked immediately after a node completes successfully.
pub type OnNodeComplete = Arc<dyn Fn(&str, &PortMap) + Send + Sync>;

/// The mutable state threaded through a single workflow run.
pub struct ExecutionState {
    pub execution_id: Uuid,
    pub workflow_id: Option<Uuid>,
    /// Per-node output port maps. Once set for a node id, never mutated.
    pub outputs: HashMap<String, PortMap>,
    /// The workflow-level inputs object, addressed by dotted path in
    /// `ParamValue::Input` references.
    pub inputs: Value,
    /// Per-run secret values, keyed by the name used in `ParamValue::Secret`.
    pub secrets: HashMap<String, Value>,
    /// Ordered log lines, `"[nodeId] Executing <type>"` / `"... Completed"`
    /// plus anything a node logged itself.
    pub logs: Vec<String>,
    /// The node currently executing, if any.
    pub current_node: Option<String>,
    /// Set on the first node failure; once set the run is over.
    pub error: Option<String>,
    pub on_node_start: Option<OnNodeStart>,
    pub on_node_complete: Option<OnNodeComplete>,
}

impl ExecutionState {
    pub fn new(execution_id: Uuid, workflow_id: Option<Uuid>, inputs: Value, secrets: HashMap<String, Value>) -> Self {
        Self {
            execution_id,
            workflow_id,
            outputs: HashMap::new(),
            inputs,
            secrets,
            logs: Vec::new(),
            current_node: None,
            error: None,
            on_node_start: None,
            on_node_complete: None,
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }
}
