//! The workflow executor — the heart of the engine.
//!
//! Single-threaded within a run: nodes execute sequentially in topological
//! order. Parallelism across runs/workers is the caller's responsibility
//! (see `worker::run_loop`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use nodes::{CancellationToken, ExecutionContext, ExecutionLogSink, NodeRegistry, PortMap};

use crate::dag::validate_dag;
use crate::dsl::{Edge, WorkflowDsl};
use crate::models::{ExecutionState, OnNodeComplete, OnNodeStart};
use crate::EngineError;

/// Optional run-time hooks, separated from [`ExecutionState`] itself so
/// constructing a run doesn't require a populated callback pair.
#[derive(Clone, Default)]
pub struct RunHooks {
    pub on_node_start: Option<OnNodeStart>,
    pub on_node_complete: Option<OnNodeComplete>,
}

/// Runs a single workflow version against a registry of node implementations.
pub struct WorkflowExecutor {
    registry: Arc<NodeRegistry>,
}

impl WorkflowExecutor {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    /// Validate and execute `dsl`, returning the final [`ExecutionState`].
    ///
    /// A validation-class failure (bad dsl version, duplicate ids, dangling
    /// edges, unknown node types, cycles) is returned as `Err` — these are
    /// rejected before a run is ever considered started. A node failure or a
    /// missing secret is instead recorded in `state.error`; the function
    /// still returns `Ok`, matching the at-least-once queue semantics where
    /// the caller persists the execution row as `status = error`.
    #[instrument(skip(self, inputs, secrets, sink, hooks, cancellation))]
    pub async fn run(
        &self,
        dsl: &WorkflowDsl,
        execution_id: Uuid,
        workflow_id: Option<Uuid>,
        inputs: Value,
        secrets: HashMap<String, Value>,
        cancellation: CancellationToken,
        sink: Arc<dyn ExecutionLogSink>,
        hooks: RunHooks,
    ) -> Result<ExecutionState, EngineError> {
        let known_types = self.registry.type_ids();
        let order = validate_dag(dsl, &known_types)?;

        let node_map: HashMap<&str, &crate::dsl::Node> = dsl.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut state = ExecutionState::new(execution_id, workflow_id, inputs, secrets);
        state.on_node_start = hooks.on_node_start;
        state.on_node_complete = hooks.on_node_complete;

        let mut executed: HashSet<String> = HashSet::new();
        let mut skipped: HashSet<String> = HashSet::new();

        for node_id in &order {
            if executed.contains(node_id) || skipped.contains(node_id) {
                continue;
            }

            let deps: HashSet<&str> = dsl
                .edges
                .iter()
                .filter(|e| &e.target == node_id)
                .map(|e| e.source.as_str())
                .collect();
            if deps.iter().any(|d| !executed.contains(*d)) {
                skipped.insert(node_id.clone());
                continue;
            }

            let node = *node_map.get(node_id.as_str()).ok_or_else(|| {
                EngineError::SchedulerInternal(format!("node '{node_id}' missing from node map during walk"))
            })?;

            state.current_node = Some(node_id.clone());
            if let Some(cb) = &state.on_node_start {
                cb(node_id, &node.node_type);
            }
            state.log(format!("[{node_id}] Executing {}", node.node_type));

            let port_inputs = crate::resolver::assemble_inputs(node_id, &dsl.edges, &state);
            let params = match crate::resolver::resolve_params(node, &state) {
                Ok(p) => p,
                Err(e) => {
                    let message = e.to_string();
                    state.log(format!("[{node_id}] {message}"));
                    state.error = Some(message);
                    error!("run {} aborted resolving params for '{}': {}", execution_id, node_id, e);
                    return Ok(state);
                }
            };

            let ctx = ExecutionContext::new(
                node_id.clone(),
                workflow_id,
                execution_id,
                state.inputs.clone(),
                cancellation.clone(),
                sink.clone(),
            );

            let definition = self
                .registry
                .get(&node.node_type)
                .ok_or_else(|| EngineError::UnknownNodeType(node.node_type.clone()))?;

            match definition.node.run(port_inputs, params, &ctx).await {
                Ok(outputs) => {
                    if let Some(cb) = &state.on_node_complete {
                        cb(node_id, &outputs);
                    }
                    prune_unselected_branches(node, &outputs, &dsl.edges, &mut skipped);
                    state.outputs.insert(node_id.clone(), outputs);
                    executed.insert(node_id.clone());
                    state.log(format!("[{node_id}] Completed"));
                }
                Err(node_err) => {
                    let message = node_err.to_string();
                    state.log(format!("[{node_id}] {message}"));
                    state.error = Some(message);
                    error!("run {} aborted at node '{}': {}", execution_id, node_id, node_err);
                    return Ok(state);
                }
            }
        }

        info!("run {} completed: {} executed, {} skipped", execution_id, executed.len(), skipped.len());
        Ok(state)
    }
}

/// For a branching node's outputs, mark the immediate downstream of every
/// non-taken outgoing edge as skipped. The main loop's dependency gate
/// (step 2 of `run`) propagates this transitively as the topological walk
/// continues, so no recursive closure is needed here.
fn prune_unselected_branches(node: &crate::dsl::Node, outputs: &PortMap, edges: &[Edge], skipped: &mut HashSet<String>) {
    let Some(taken) = taken_handles(&node.node_type, outputs) else {
        return;
    };
    for edge in edges.iter().filter(|e| e.source == node.id) {
        if !taken.contains(edge.source_handle.as_str()) {
            skipped.insert(edge.target.clone());
        }
    }
}

/// The set of outgoing handles a branching node "took" this run, or `None`
/// if the node is not a recognised branching type or its result could not be
/// classified (in which case every outgoing edge is taken).
fn taken_handles(node_type: &str, outputs: &PortMap) -> Option<HashSet<String>> {
    if !nodes::builtin::BRANCHING_TYPES.contains(&node_type) {
        return None;
    }
    match node_type {
        "if-condition" => match outputs.get("result").and_then(Value::as_bool) {
            Some(true) => Some(["true".to_string()].into_iter().collect()),
            Some(false) => Some(["false".to_string()].into_iter().collect()),
            None => None,
        },
        "switch" => outputs
            .get("match")
            .and_then(Value::as_str)
            .map(|label| [label.to_string()].into_iter().collect()),
        _ => None,
    }
}

/// Collect workflow-level outputs: every node whose type is `output` or
/// which has no outgoing edges (a sink), keyed by the node's label or id.
pub fn derive_outputs(dsl: &WorkflowDsl, state: &ExecutionState) -> HashMap<String, PortMap> {
    let mut sources: HashSet<&str> = HashSet::new();
    for edge in &dsl.edges {
        sources.insert(edge.source.as_str());
    }

    dsl.nodes
        .iter()
        .filter(|n| n.node_type == "output" || !sources.contains(n.id.as_str()))
        .filter_map(|n| state.outputs.get(&n.id).map(|ports| (n.output_key().to_string(), ports.clone())))
        .collect()
}
