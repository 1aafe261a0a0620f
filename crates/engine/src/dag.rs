//! DAG validation — run this before persisting or executing a workflow.
//!
//! Rules enforced:
//! 1. Node IDs must be unique within the workflow.
//! 2. Every edge must reference valid node IDs (both `source` and `target`).
//! 3. Every node's `type` must be a known, registered node type.
//! 4. The directed graph must be acyclic (topological sort must succeed).
//!
//! Returns a topologically-sorted list of node IDs on success. Tie-breaking
//! among ready nodes is unspecified beyond being deterministic for a given
//! input — this implementation walks the ready queue in node-declaration order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::dsl::WorkflowDsl;
use crate::EngineError;

/// Validate the workflow's DAG and return nodes in topological execution order.
///
/// `known_node_types` is the set of ids currently registered in the node
/// registry; an unrecognised `type` is rejected before the topological walk.
///
/// # Errors
/// - [`EngineError::DuplicateNodeId`] if two nodes share an ID.
/// - [`EngineError::UnknownNodeReference`] if an edge references a missing node.
/// - [`EngineError::UnknownNodeType`] if a node's type is not registered.
/// - [`EngineError::CyclicWorkflow`] if the graph is not acyclic.
pub fn validate_dag(dsl: &WorkflowDsl, known_node_types: &HashSet<String>) -> Result<Vec<String>, EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &dsl.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
        if !known_node_types.contains(&node.node_type) {
            return Err(EngineError::UnknownNodeType(node.node_type.clone()));
        }
    }

    let node_set: HashSet<&str> = dsl.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &dsl.edges {
        if !node_set.contains(edge.source.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !node_set.contains(edge.target.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
    }

    // Kahn's algorithm.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in &dsl.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    for edge in &dsl.edges {
        adjacency.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = dsl
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(dsl.nodes.len());

    while let Some(node_id) = queue.pop_front() {
        sorted.push(node_id.to_owned());

        if let Some(neighbours) = adjacency.get(node_id) {
            for &neighbour in neighbours {
                let deg = in_degree.entry(neighbour).or_insert(0);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    if sorted.len() != dsl.nodes.len() {
        return Err(EngineError::CyclicWorkflow);
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Edge, Node, WorkflowMeta};
    use chrono::Utc;
    use std::collections::HashMap as StdHashMap;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "mock".to_string(),
            label: None,
            params: StdHashMap::new(),
            inputs: StdHashMap::new(),
            outputs: StdHashMap::new(),
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

    fn dsl(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowDsl {
        WorkflowDsl {
            dsl_version: crate::dsl::CURRENT_DSL_VERSION.to_string(),
            meta: WorkflowMeta {
                name: "test".to_string(),
                version: 1,
                created_at: Utc::now(),
            },
            inputs: StdHashMap::new(),
            outputs: StdHashMap::new(),
            secrets: Vec::new(),
            nodes,
            edges,
        }
    }

    fn known() -> HashSet<String> {
        ["mock"].into_iter().map(String::from).collect()
    }

    #[test]
    fn valid_linear_dag_returns_sorted_order() {
        let wf = dsl(
            vec![node("a"), node("b"), node("c")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c")],
        );
        let sorted = validate_dag(&wf, &known()).expect("should be valid");
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_topological_order_starts_a_ends_d() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let wf = dsl(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![
                edge("e1", "a", "b"),
                edge("e2", "a", "c"),
                edge("e3", "b", "d"),
                edge("e4", "c", "d"),
            ],
        );
        let sorted = validate_dag(&wf, &known()).expect("should be valid");
        assert_eq!(sorted.first().unwrap(), "a");
        assert_eq!(sorted.last().unwrap(), "d");
        assert_eq!(sorted.len(), 4);
        let b_pos = sorted.iter().position(|n| n == "b").unwrap();
        let c_pos = sorted.iter().position(|n| n == "c").unwrap();
        assert!((1..=2).contains(&b_pos) && (1..=2).contains(&c_pos));
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let wf = dsl(vec![node("a"), node("a")], vec![]);
        assert!(matches!(
            validate_dag(&wf, &known()),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected() {
        let wf = dsl(vec![node("a")], vec![edge("e1", "a", "ghost")]);
        assert!(matches!(
            validate_dag(&wf, &known()),
            Err(EngineError::UnknownNodeReference { node_id, .. }) if node_id == "ghost"
        ));
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let mut wf = dsl(vec![node("a")], vec![]);
        wf.nodes[0].node_type = "does-not-exist".to_string();
        assert!(matches!(validate_dag(&wf, &known()), Err(EngineError::UnknownNodeType(t)) if t == "does-not-exist"));
    }

    #[test]
    fn cycle_is_detected() {
        // A → B → C → A
        let wf = dsl(
            vec![node("a"), node("b"), node("c")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "c", "a")],
        );
        assert!(matches!(validate_dag(&wf, &known()), Err(EngineError::CyclicWorkflow)));
    }

    #[test]
    fn single_node_no_edges_is_valid() {
        let wf = dsl(vec![node("solo")], vec![]);
        let sorted = validate_dag(&wf, &known()).expect("single node should be valid");
        assert_eq!(sorted, vec!["solo"]);
    }
}
