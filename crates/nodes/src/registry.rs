//! `NodeRegistry` — the process-wide mapping from node-type-id to
//! `NodeDefinition`.
//!
//! Registration happens once at process startup (see `cli`/`worker` main
//! functions, which call `builtin::register_builtin_nodes`). The registry is
//! treated as read-only during execution: concurrent readers across workers
//! are safe, and the DAG scheduler never mutates it mid-run.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::schema::{IOSchema, ParamSchema};
use crate::traits::ExecutableNode;

/// Visual/organisational metadata surfaced to the graph editor.
#[derive(Debug, Clone, Default)]
pub struct NodeDisplay {
    pub icon: Option<String>,
    pub color: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
}

/// A registered node type: its schemas, display metadata, and the
/// `run` implementation the scheduler invokes.
pub struct NodeDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub inputs: HashMap<String, IOSchema>,
    pub outputs: HashMap<String, IOSchema>,
    pub params_schema: HashMap<String, ParamSchema>,
    pub display: NodeDisplay,
    pub node: Arc<dyn ExecutableNode>,
}

/// Projection of a `NodeDefinition` exposed to the editor for picking nodes.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub category: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub tags: Vec<String>,
    pub input_count: usize,
    pub output_count: usize,
}

impl From<&NodeDefinition> for CatalogEntry {
    fn from(def: &NodeDefinition) -> Self {
        Self {
            id: def.id.clone(),
            display_name: def.display_name.clone(),
            description: def.description.clone(),
            category: def.display.category.clone(),
            icon: def.display.icon.clone(),
            color: def.display.color.clone(),
            tags: def.display.tags.clone(),
            input_count: def.inputs.len(),
            output_count: def.outputs.len(),
        }
    }
}

/// Process-wide registry of node definitions, keyed by `NodeDefinition::id`.
#[derive(Default)]
pub struct NodeRegistry {
    entries: RwLock<HashMap<String, Arc<NodeDefinition>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node definition. Re-registering an existing id overwrites
    /// it and emits a warning — this is the only extension point for new
    /// node behaviours, and silent shadowing would be a footgun.
    pub fn register(&self, definition: NodeDefinition) {
        let id = definition.id.clone();
        let mut entries = self.entries.write().expect("node registry lock poisoned");
        if entries.contains_key(&id) {
            warn!("node type '{}' re-registered, overwriting previous definition", id);
        }
        entries.insert(id, Arc::new(definition));
    }

    pub fn get(&self, id: &str) -> Option<Arc<NodeDefinition>> {
        self.entries
            .read()
            .expect("node registry lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.read().expect("node registry lock poisoned").contains_key(id)
    }

    pub fn get_all(&self) -> Vec<Arc<NodeDefinition>> {
        self.entries
            .read()
            .expect("node registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn get_by_category(&self, category: &str) -> Vec<Arc<NodeDefinition>> {
        self.get_all()
            .into_iter()
            .filter(|d| d.display.category == category)
            .collect()
    }

    pub fn get_by_tag(&self, tag: &str) -> Vec<Arc<NodeDefinition>> {
        self.get_all()
            .into_iter()
            .filter(|d| d.display.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Remove a node definition, returning it if one was registered.
    pub fn unregister(&self, id: &str) -> Option<Arc<NodeDefinition>> {
        self.entries.write().expect("node registry lock poisoned").remove(id)
    }

    pub fn clear(&self) {
        self.entries.write().expect("node registry lock poisoned").clear();
    }

    /// Every registered type id, for cheap DAG-validation membership checks.
    pub fn type_ids(&self) -> std::collections::HashSet<String> {
        self.entries.read().expect("node registry lock poisoned").keys().cloned().collect()
    }

    /// The editor-facing node catalog.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.get_all().iter().map(|d| CatalogEntry::from(d.as_ref())).collect()
    }
}
