//! Parameter resolution and port-input assembly.
//!
//! Turns DSL-level references (`ParamValue`, edges) into the plain JSON
//! values and port maps a node's `run` actually receives.

use std::collections::HashMap;

use nodes::PortMap;
use serde_json::Value;

use crate::dsl::{Edge, Node, ParamValue};
use crate::models::ExecutionState;
use crate::EngineError;

/// Resolve a single `ParamValue` against the current run state.
///
/// - `static` returns its literal value.
/// - `secret` looks up `state.secrets`; a missing key is `SecretMissing`.
/// - `input` descends `state.inputs` along a dotted path; a missing or null
///   step yields `Value::Null` (distinguishing "missing" from "null" is a
///   non-goal — see `resolve_input_path`).
pub fn resolve_param(value: &ParamValue, state: &ExecutionState) -> Result<Value, EngineError> {
    match value {
        ParamValue::Static { value } => Ok(value.clone()),
        ParamValue::Secret { key } => state
            .secrets
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::SecretMissing(key.clone())),
        ParamValue::Input { path } => Ok(resolve_input_path(path, &state.inputs)),
    }
}

/// Descend a dot-separated path into a JSON value, returning `Value::Null`
/// on any missing or non-object intermediate step.
pub fn resolve_input_path(path: &str, inputs: &Value) -> Value {
    let mut current = inputs;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Resolve every declared parameter on a node.
pub fn resolve_params(node: &Node, state: &ExecutionState) -> Result<HashMap<String, Value>, EngineError> {
    node.params
        .iter()
        .map(|(name, value)| resolve_param(value, state).map(|v| (name.clone(), v)))
        .collect()
}

/// Assemble a node's port inputs from the edges that target it.
///
/// For each incoming edge `(source, sourceHandle) → (target, targetHandle)`,
/// takes `state.outputs[source][sourceHandle]` and writes it under
/// `targetHandle`. An edge whose source never executed (a pruned branch)
/// contributes nothing for that port. Multiple edges targeting the same port
/// resolve last-write-wins, in edge declaration order.
pub fn assemble_inputs(node_id: &str, edges: &[Edge], state: &ExecutionState) -> PortMap {
    let mut inputs = PortMap::new();
    for edge in edges.iter().filter(|e| e.target == node_id) {
        if let Some(value) = state
            .outputs
            .get(&edge.source)
            .and_then(|ports| ports.get(&edge.source_handle))
        {
            inputs.insert(edge.target_handle.clone(), value.clone());
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn state_with(inputs: Value, secrets: HashMap<String, Value>) -> ExecutionState {
        ExecutionState::new(Uuid::new_v4(), None, inputs, secrets)
    }

    #[test]
    fn static_param_returns_literal() {
        let state = state_with(json!({}), HashMap::new());
        let value = resolve_param(&ParamValue::Static { value: json!("gpt-4") }, &state).unwrap();
        assert_eq!(value, json!("gpt-4"));
    }

    #[test]
    fn secret_param_resolves_when_present() {
        let mut secrets = HashMap::new();
        secrets.insert("OPENAI_KEY".to_string(), json!("sk-123"));
        let state = state_with(json!({}), secrets);

        let value = resolve_param(
            &ParamValue::Secret {
                key: "OPENAI_KEY".to_string(),
            },
            &state,
        )
        .unwrap();
        assert_eq!(value, json!("sk-123"));
    }

    #[test]
    fn secret_param_fails_when_missing() {
        let state = state_with(json!({}), HashMap::new());
        let err = resolve_param(
            &ParamValue::Secret {
                key: "OPENAI_KEY".to_string(),
            },
            &state,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::SecretMissing(k) if k == "OPENAI_KEY"));
    }

    #[test]
    fn input_param_descends_dotted_path() {
        let state = state_with(json!({"a": {"b": {"c": 42}}}), HashMap::new());
        let value = resolve_param(
            &ParamValue::Input {
                path: "a.b.c".to_string(),
            },
            &state,
        )
        .unwrap();
        assert_eq!(value, json!(42));
    }

    #[test]
    fn input_param_missing_step_is_null() {
        let state = state_with(json!({"a": {}}), HashMap::new());
        let value = resolve_param(
            &ParamValue::Input {
                path: "a.b.c".to_string(),
            },
            &state,
        )
        .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn resolve_params_resolves_model_and_secret_together() {
        let mut secrets = HashMap::new();
        secrets.insert("OPENAI_KEY".to_string(), json!("sk-secret"));
        let state = state_with(json!({}), secrets);

        let mut params = HashMap::new();
        params.insert("model".to_string(), ParamValue::Static { value: json!("gpt-4") });
        params.insert(
            "apiKey".to_string(),
            ParamValue::Secret {
                key: "OPENAI_KEY".to_string(),
            },
        );
        let node = Node {
            id: "n".to_string(),
            node_type: "mock".to_string(),
            label: None,
            params,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        };

        let resolved = resolve_params(&node, &state).unwrap();
        assert_eq!(resolved["model"], json!("gpt-4"));
        assert_eq!(resolved["apiKey"], json!("sk-secret"));
    }

    #[test]
    fn assemble_inputs_last_write_wins_in_edge_order() {
        let mut state = state_with(json!({}), HashMap::new());
        state.outputs.insert("a".to_string(), PortMap::from([("out".to_string(), json!(1))]));
        state.outputs.insert("b".to_string(), PortMap::from([("out".to_string(), json!(2))]));

        let edges = vec![
            Edge {
                id: "e1".to_string(),
                source: "a".to_string(),
                target: "c".to_string(),
                source_handle: "out".to_string(),
                target_handle: "in".to_string(),
            },
            Edge {
                id: "e2".to_string(),
                source: "b".to_string(),
                target: "c".to_string(),
                source_handle: "out".to_string(),
                target_handle: "in".to_string(),
            },
        ];

        let inputs = assemble_inputs("c", &edges, &state);
        assert_eq!(inputs["in"], json!(2));
    }

    #[test]
    fn assemble_inputs_skips_unexecuted_sources() {
        let state = state_with(json!({}), HashMap::new());
        let edges = vec![Edge {
            id: "e1".to_string(),
            source: "pruned".to_string(),
            target: "c".to_string(),
            source_handle: "out".to_string(),
            target_handle: "in".to_string(),
        }];

        let inputs = assemble_inputs("c", &edges, &state);
        assert!(inputs.get("in").is_none());
    }
}
