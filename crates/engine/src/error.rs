//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the workflow engine (validation + execution).
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// `dslVersion` does not match the one this engine supports.
    #[error("dsl version mismatch: expected '{expected}', found '{found}'")]
    DslVersionMismatch { expected: String, found: String },

    /// Two or more nodes share the same ID.
    #[error("duplicate node id: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the workflow.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference { node_id: String, side: &'static str },

    /// A node's `type` has no matching entry in the node registry.
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    /// Topological sort detected a cycle.
    #[error("Workflow contains cycles")]
    CyclicWorkflow,

    /// A `ParamValue::Secret` reference had no corresponding entry in the
    /// run's secret map.
    #[error("secret '{0}' is missing")]
    SecretMissing(String),

    /// A node's `run` threw.
    #[error("node '{node_id}' failed: {message}")]
    NodeRuntimeError { node_id: String, message: String },

    /// An unexpected condition internal to the scheduler (e.g. a node id
    /// present in the topological order but absent from the node map).
    #[error("scheduler internal error: {0}")]
    SchedulerInternal(String),
}
