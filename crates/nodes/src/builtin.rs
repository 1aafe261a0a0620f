//! A handful of reference node implementations.
//!
//! These exist to make the DAG scheduler's control-flow mechanisms —
//! conditional branch pruning and parameter/template substitution — testable
//! end to end. They are deliberately minimal; a packaged node library with
//! real integrations (HTTP, databases, LLM providers, …) is out of scope —
//! the node *protocol* is what this crate specifies, not a catalog of
//! business logic.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::{NodeDefinition, NodeDisplay, NodeRegistry};
use crate::schema::{IOSchema, ParamSchema, ValueKind};
use crate::traits::{ExecutionContext, PortMap};
use crate::{ExecutableNode, NodeError};

/// The node-type ids the scheduler must know how to branch on. Kept as data
/// (not open polymorphism) per the spec's own framing of this as the
/// simplest defensible design — see DESIGN.md.
pub const BRANCHING_TYPES: &[&str] = &["if-condition", "switch"];

/// `if-condition` — evaluates `params.value` for truthiness and reports the
/// result on the `result` output port. The scheduler reads this port to
/// decide which of the `"true"` / `"false"` outgoing edges to take.
pub struct IfConditionNode;

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[async_trait]
impl ExecutableNode for IfConditionNode {
    async fn run(
        &self,
        inputs: PortMap,
        params: HashMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError> {
        let value = params
            .get("value")
            .or_else(|| inputs.get("value"))
            .cloned()
            .unwrap_or(Value::Null);

        let result = is_truthy(&value);
        ctx.log(format!("if-condition evaluated to {result}"));

        let mut out = PortMap::new();
        out.insert("result".to_string(), Value::Bool(result));
        Ok(out)
    }
}

/// `switch` — matches `params.value` against `params.cases` (an array of
/// `{label, value}` objects) and reports the matched label on the `match`
/// output port. Falls back to the last declared case when nothing matches
/// and no `"default"` case exists — the behaviour is deliberately
/// underspecified upstream; callers should not rely on it.
pub struct SwitchNode;

#[async_trait]
impl ExecutableNode for SwitchNode {
    async fn run(
        &self,
        inputs: PortMap,
        params: HashMap<String, Value>,
        ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError> {
        let value = params
            .get("value")
            .or_else(|| inputs.get("value"))
            .cloned()
            .unwrap_or(Value::Null);

        let cases = params
            .get("cases")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let matched = cases.iter().find_map(|case| {
            let label = case.get("label")?.as_str()?;
            let case_value = case.get("value")?;
            (case_value == &value).then(|| label.to_string())
        });

        let matched = matched
            .or_else(|| {
                cases
                    .iter()
                    .find_map(|c| c.get("label").and_then(Value::as_str))
                    .filter(|l| *l == "default")
                    .map(str::to_string)
            })
            .or_else(|| cases.last().and_then(|c| c.get("label")).and_then(Value::as_str).map(str::to_string));

        ctx.log(format!("switch matched case {matched:?}"));

        let mut out = PortMap::new();
        if let Some(label) = matched {
            out.insert("match".to_string(), Value::String(label));
        }
        Ok(out)
    }
}

/// `template` — substitutes `{{name}}` placeholders in `params.template`
/// with values from `inputs.variables`.
pub struct TemplateNode;

fn render_template(template: &str, variables: &Value) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        rest = &rest[start + 2..];

        let Some(end) = rest.find("}}") else {
            rendered.push_str("{{");
            rendered.push_str(rest);
            rest = "";
            break;
        };

        let key = rest[..end].trim();
        let replacement = variables
            .get(key)
            .map(value_to_display_string)
            .unwrap_or_default();
        rendered.push_str(&replacement);
        rest = &rest[end + 2..];
    }
    rendered.push_str(rest);
    rendered
}

fn value_to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ExecutableNode for TemplateNode {
    async fn run(
        &self,
        inputs: PortMap,
        params: HashMap<String, Value>,
        _ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError> {
        let template = params
            .get("template")
            .and_then(Value::as_str)
            .ok_or_else(|| NodeError::Fatal("template node requires a 'template' param".to_string()))?;

        let variables = inputs.get("variables").cloned().unwrap_or(json!({}));
        let result = render_template(template, &variables);

        let mut out = PortMap::new();
        out.insert("result".to_string(), Value::String(result));
        Ok(out)
    }
}

/// `output` — a sink node that passes its inputs straight through. Any node
/// whose type is `output`, or which has no outgoing edges, contributes to
/// the workflow's final outputs (see `engine::executor::derive_outputs`).
pub struct OutputNode;

#[async_trait]
impl ExecutableNode for OutputNode {
    async fn run(
        &self,
        inputs: PortMap,
        _params: HashMap<String, Value>,
        _ctx: &ExecutionContext,
    ) -> Result<PortMap, NodeError> {
        Ok(inputs)
    }
}

/// Register the reference node set on `registry`. Call once at process
/// startup (see `cli`/`worker` entry points).
pub fn register_builtin_nodes(registry: &NodeRegistry) {
    registry.register(NodeDefinition {
        id: "if-condition".to_string(),
        display_name: "If".to_string(),
        description: "Branches on the truthiness of a value.".to_string(),
        inputs: HashMap::from([("value".to_string(), IOSchema::any())]),
        outputs: HashMap::from([("result".to_string(), IOSchema::of(ValueKind::Boolean))]),
        params_schema: HashMap::from([(
            "value".to_string(),
            ParamSchema::Json {
                label: "Condition value".to_string(),
                description: None,
                default: None,
                required: true,
            },
        )]),
        display: NodeDisplay {
            icon: Some("git-branch".to_string()),
            color: Some("#e67e22".to_string()),
            category: "logic".to_string(),
            tags: vec!["control-flow".to_string()],
        },
        node: Arc::new(IfConditionNode),
    });

    registry.register(NodeDefinition {
        id: "switch".to_string(),
        display_name: "Switch".to_string(),
        description: "Branches on the first matching case.".to_string(),
        inputs: HashMap::from([("value".to_string(), IOSchema::any())]),
        outputs: HashMap::from([("match".to_string(), IOSchema::of(ValueKind::String))]),
        params_schema: HashMap::from([(
            "cases".to_string(),
            ParamSchema::Json {
                label: "Cases".to_string(),
                description: Some("Array of {label, value} objects".to_string()),
                default: None,
                required: true,
            },
        )]),
        display: NodeDisplay {
            icon: Some("shuffle".to_string()),
            color: Some("#e67e22".to_string()),
            category: "logic".to_string(),
            tags: vec!["control-flow".to_string()],
        },
        node: Arc::new(SwitchNode),
    });

    registry.register(NodeDefinition {
        id: "template".to_string(),
        display_name: "Template".to_string(),
        description: "Renders a {{placeholder}} string against input variables.".to_string(),
        inputs: HashMap::from([("variables".to_string(), IOSchema::of(ValueKind::Object))]),
        outputs: HashMap::from([("result".to_string(), IOSchema::of(ValueKind::String))]),
        params_schema: HashMap::from([(
            "template".to_string(),
            ParamSchema::String {
                label: "Template".to_string(),
                description: None,
                default: None,
                required: true,
            },
        )]),
        display: NodeDisplay {
            icon: Some("file-text".to_string()),
            color: Some("#3498db".to_string()),
            category: "text".to_string(),
            tags: vec![],
        },
        node: Arc::new(TemplateNode),
    });

    registry.register(NodeDefinition {
        id: "output".to_string(),
        display_name: "Output".to_string(),
        description: "Passes its inputs through as a workflow output.".to_string(),
        inputs: HashMap::new(),
        outputs: HashMap::new(),
        params_schema: HashMap::new(),
        display: NodeDisplay {
            icon: Some("log-out".to_string()),
            color: Some("#2ecc71".to_string()),
            category: "flow".to_string(),
            tags: vec!["sink".to_string()],
        },
        node: Arc::new(OutputNode),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(
            "n",
            None,
            uuid::Uuid::new_v4(),
            json!({}),
            Default::default(),
            Arc::new(crate::traits::NullLogSink),
        )
    }

    #[tokio::test]
    async fn if_condition_truthy_value_zero_is_false() {
        let mut params = HashMap::new();
        params.insert("value".to_string(), json!(0));
        let out = IfConditionNode.run(PortMap::new(), params, &ctx()).await.unwrap();
        assert_eq!(out["result"], json!(false));
    }

    #[tokio::test]
    async fn if_condition_truthy_nonempty_string_is_true() {
        let mut params = HashMap::new();
        params.insert("value".to_string(), json!("hello"));
        let out = IfConditionNode.run(PortMap::new(), params, &ctx()).await.unwrap();
        assert_eq!(out["result"], json!(true));
    }

    #[tokio::test]
    async fn switch_matches_declared_case() {
        let mut params = HashMap::new();
        params.insert("value".to_string(), json!("b"));
        params.insert(
            "cases".to_string(),
            json!([{"label": "case_a", "value": "a"}, {"label": "case_b", "value": "b"}]),
        );
        let out = SwitchNode.run(PortMap::new(), params, &ctx()).await.unwrap();
        assert_eq!(out["match"], json!("case_b"));
    }

    #[tokio::test]
    async fn switch_falls_back_to_last_case_when_unmatched() {
        let mut params = HashMap::new();
        params.insert("value".to_string(), json!("z"));
        params.insert(
            "cases".to_string(),
            json!([{"label": "case_a", "value": "a"}, {"label": "case_b", "value": "b"}]),
        );
        let out = SwitchNode.run(PortMap::new(), params, &ctx()).await.unwrap();
        assert_eq!(out["match"], json!("case_b"));
    }

    #[tokio::test]
    async fn template_substitutes_variables() {
        let mut params = HashMap::new();
        params.insert(
            "template".to_string(),
            json!("Hello, {{name}}! You are {{age}} years old."),
        );
        let mut inputs = PortMap::new();
        inputs.insert("variables".to_string(), json!({"name": "Alice", "age": 30}));

        let out = TemplateNode.run(inputs, params, &ctx()).await.unwrap();
        assert_eq!(out["result"], json!("Hello, Alice! You are 30 years old."));
    }

    #[tokio::test]
    async fn output_node_passes_inputs_through() {
        let mut inputs = PortMap::new();
        inputs.insert("x".to_string(), json!(42));
        let out = OutputNode.run(inputs.clone(), HashMap::new(), &ctx()).await.unwrap();
        assert_eq!(out, inputs);
    }

    #[test]
    fn register_builtin_nodes_populates_registry() {
        let registry = NodeRegistry::new();
        register_builtin_nodes(&registry);
        for id in ["if-condition", "switch", "template", "output"] {
            assert!(registry.has(id), "expected '{id}' to be registered");
        }
    }
}
