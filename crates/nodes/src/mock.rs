//! `MockNode` — a test double for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real node implementation is
//! either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{ExecutionContext, PortMap};
use crate::{ExecutableNode, NodeError};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific output port map.
    ReturnValue(PortMap),
    /// Fail with a `Retryable` error.
    FailRetryable(String),
    /// Fail with a `Fatal` error.
    FailFatal(String),
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `run` is called.
    pub behaviour: MockBehaviour,
    /// All port-input maps seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<PortMap>>>,
}

impl MockNode {
    /// Create a mock that always succeeds, merging `value` (if an object)
    /// into its output alongside a `"node"` field naming the mock.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        let mut out = PortMap::new();
        out.insert("node".to_string(), Value::String(name.into()));
        if let Value::Object(map) = value {
            for (k, v) in map {
                out.insert(k, v);
            }
        }
        let name = out["node"].as_str().unwrap().to_string();
        Self {
            name,
            behaviour: MockBehaviour::ReturnValue(out),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailFatal(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails with a `Retryable` error.
    pub fn failing_retryable(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailRetryable(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn run(
        &self,
        inputs: PortMap,
        _params: HashMap<String, Value>,
        _ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError> {
        self.calls.lock().unwrap().push(inputs);

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(v.clone()),
            MockBehaviour::FailRetryable(msg) => Err(NodeError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg) => Err(NodeError::Fatal(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returning_merges_value_and_records_call() {
        let node = MockNode::returning("step", json!({ "x": 1 }));
        let ctx = ExecutionContext::new(
            "step",
            None,
            uuid::Uuid::new_v4(),
            json!({}),
            Default::default(),
            Arc::new(crate::traits::NullLogSink),
        );

        let mut inputs = PortMap::new();
        inputs.insert("in".to_string(), json!("hello"));

        let out = node.run(inputs, HashMap::new(), &ctx).await.unwrap();
        assert_eq!(out["node"], json!("step"));
        assert_eq!(out["x"], json!(1));
        assert_eq!(node.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_fatal_returns_fatal_error() {
        let node = MockNode::failing_fatal("boom", "kaboom");
        let ctx = ExecutionContext::new(
            "boom",
            None,
            uuid::Uuid::new_v4(),
            json!({}),
            Default::default(),
            Arc::new(crate::traits::NullLogSink),
        );
        let err = node.run(PortMap::new(), HashMap::new(), &ctx).await.unwrap_err();
        assert!(matches!(err, NodeError::Fatal(msg) if msg == "kaboom"));
    }
}
