//! The persisted workflow DSL: nodes, edges, parameter references, and the
//! editor-graph conversion.
//!
//! This is the canonical on-disk/in-database shape (see `db::models::WorkflowVersionRow`).
//! The graph editor works with a slightly richer [`EditorGraph`] that carries
//! node positions; conversion to/from the DSL is lossless on DSL fields.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nodes::IOSchema;

/// The only DSL version this implementation accepts.
pub const CURRENT_DSL_VERSION: &str = "1.0";

/// A parameter reference: static value, secret lookup, or workflow-input path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamValue {
    /// A literal value, used as-is.
    Static { value: serde_json::Value },
    /// An opaque key resolved against the per-run secret map.
    Secret {
        #[serde(rename = "ref")]
        key: String,
    },
    /// A dot-separated lookup path into the workflow-level inputs object.
    Input { path: String },
}

/// A single step in the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within this workflow.
    pub id: String,
    /// Registered node-type id (maps to a `nodes::NodeDefinition`).
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
    #[serde(default)]
    pub inputs: HashMap<String, IOSchema>,
    #[serde(default)]
    pub outputs: HashMap<String, IOSchema>,
}

impl Node {
    /// The key workflow-level outputs are collected under — `label` if set,
    /// otherwise the node's own id.
    pub fn output_key(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A directed edge from one node's output port to another's input port.
///
/// Multiple edges may target the same `(target, target_handle)` pair; the
/// scheduler resolves that last-write-wins in edge order (see
/// `resolver::assemble_inputs`). Well-formed graphs should not rely on this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_handle: String,
    pub target_handle: String,
}

/// `WorkflowDSL.meta` — bookkeeping that is not itself part of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMeta {
    pub name: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

/// The canonical, persisted workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDsl {
    pub dsl_version: String,
    pub meta: WorkflowMeta,
    #[serde(default)]
    pub inputs: HashMap<String, IOSchema>,
    #[serde(default)]
    pub outputs: HashMap<String, IOSchema>,
    #[serde(default)]
    pub secrets: Vec<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// A single structural validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationErrorEntry {
    /// JSON-pointer-ish path to the offending field, e.g. `"meta.name"`.
    pub path: String,
    pub message: String,
}

impl ValidationErrorEntry {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Structural validation of a DSL document.
///
/// Checks: `dslVersion` matches the supported tag, `meta.name` is non-empty,
/// node ids are unique, and every edge endpoint resolves to an existing node.
/// An empty return value means the document is accepted. This does *not*
/// check for cycles or unknown node types — see [`crate::dag::validate_dag`].
pub fn validate(dsl: &WorkflowDsl) -> Vec<ValidationErrorEntry> {
    let mut errors = Vec::new();

    if dsl.dsl_version != CURRENT_DSL_VERSION {
        errors.push(ValidationErrorEntry::new(
            "dslVersion",
            format!(
                "unsupported dslVersion '{}', expected '{}'",
                dsl.dsl_version, CURRENT_DSL_VERSION
            ),
        ));
    }

    if dsl.meta.name.trim().is_empty() {
        errors.push(ValidationErrorEntry::new("meta.name", "must not be empty"));
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (i, node) in dsl.nodes.iter().enumerate() {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(ValidationErrorEntry::new(
                format!("nodes[{i}].id"),
                format!("duplicate node id '{}'", node.id),
            ));
        }
    }

    let node_ids: HashSet<&str> = dsl.nodes.iter().map(|n| n.id.as_str()).collect();
    for (i, edge) in dsl.edges.iter().enumerate() {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationErrorEntry::new(
                format!("edges[{i}].source"),
                format!("edge references unknown node '{}'", edge.source),
            ));
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(ValidationErrorEntry::new(
                format!("edges[{i}].target"),
                format!("edge references unknown node '{}'", edge.target),
            ));
        }
    }

    errors
}

/// Node position on the editor canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// The editor's view of a workflow: the DSL plus a node-id → position
/// side map. Conversion to/from [`WorkflowDsl`] is lossless on DSL fields;
/// nodes with no recorded position are omitted from the side map rather than
/// defaulted, so the round trip stays exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorGraph {
    pub dsl: WorkflowDsl,
    pub positions: HashMap<String, Position>,
}

/// Attach editor positions to a DSL document.
pub fn to_editor_graph(dsl: WorkflowDsl, positions: HashMap<String, Position>) -> EditorGraph {
    EditorGraph { dsl, positions }
}

/// Discard positions and return the canonical DSL.
pub fn from_editor_graph(graph: EditorGraph) -> (WorkflowDsl, HashMap<String, Position>) {
    (graph.dsl, graph.positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, node_type: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: node_type.to_string(),
            label: None,
            params: HashMap::new(),
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: "out".to_string(),
            target_handle: "in".to_string(),
        }
    }

    fn minimal_dsl(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowDsl {
        WorkflowDsl {
            dsl_version: CURRENT_DSL_VERSION.to_string(),
            meta: WorkflowMeta {
                name: "test workflow".to_string(),
                version: 1,
                created_at: Utc::now(),
            },
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            secrets: Vec::new(),
            nodes,
            edges,
        }
    }

    #[test]
    fn accepts_well_formed_dsl() {
        let dsl = minimal_dsl(vec![node("a", "mock"), node("b", "mock")], vec![edge("e1", "a", "b")]);
        assert!(validate(&dsl).is_empty());
    }

    #[test]
    fn rejects_version_mismatch() {
        let mut dsl = minimal_dsl(vec![node("a", "mock")], vec![]);
        dsl.dsl_version = "0.9".to_string();
        let errors = validate(&dsl);
        assert!(errors.iter().any(|e| e.path == "dslVersion"));
    }

    #[test]
    fn rejects_empty_name() {
        let mut dsl = minimal_dsl(vec![node("a", "mock")], vec![]);
        dsl.meta.name = "   ".to_string();
        let errors = validate(&dsl);
        assert!(errors.iter().any(|e| e.path == "meta.name"));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let dsl = minimal_dsl(vec![node("a", "mock"), node("a", "mock")], vec![]);
        let errors = validate(&dsl);
        assert!(errors.iter().any(|e| e.message.contains("duplicate node id")));
    }

    #[test]
    fn rejects_dangling_edge_endpoints() {
        let dsl = minimal_dsl(vec![node("a", "mock")], vec![edge("e1", "a", "ghost")]);
        let errors = validate(&dsl);
        assert!(errors.iter().any(|e| e.path == "edges[0].target"));
    }

    #[test]
    fn re_validating_an_accepted_dsl_is_idempotent() {
        let dsl = minimal_dsl(vec![node("a", "mock")], vec![]);
        assert!(validate(&dsl).is_empty());
        assert!(validate(&dsl).is_empty());
    }

    #[test]
    fn editor_graph_round_trip_preserves_dsl_fields() {
        let dsl = minimal_dsl(vec![node("a", "mock"), node("b", "mock")], vec![edge("e1", "a", "b")]);
        let mut positions = HashMap::new();
        positions.insert("a".to_string(), Position { x: 10.0, y: 20.0 });

        let graph = to_editor_graph(dsl.clone(), positions.clone());
        let (round_tripped, round_tripped_positions) = from_editor_graph(graph);

        assert_eq!(
            serde_json::to_value(&round_tripped).unwrap(),
            serde_json::to_value(&dsl).unwrap()
        );
        assert_eq!(round_tripped_positions, positions);
    }

    #[test]
    fn param_value_serializes_with_type_tag() {
        let v = ParamValue::Secret {
            key: "OPENAI_KEY".to_string(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, json!({"type": "secret", "ref": "OPENAI_KEY"}));
    }
}
