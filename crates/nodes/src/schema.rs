//! Typed I/O schema and parameter-schema declarations.
//!
//! `IOSchema` describes the shape of a value flowing through a node port or a
//! workflow-level input/output. `ParamSchema` is the editor-facing
//! declaration of a node parameter (as opposed to `ParamValue`, the DSL's
//! *reference* to a parameter value, which lives in the `engine` crate).
//!
//! Schemas are descriptive only — the runtime does not enforce them against
//! actual values at execution time (see `ExecutableNode::run`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The primitive shape of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl Default for ValueKind {
    fn default() -> Self {
        Self::Any
    }
}

/// A recursive value-type descriptor used for node ports and workflow-level
/// inputs/outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IOSchema {
    #[serde(default)]
    pub kind: ValueKind,
    /// Element schema, present when `kind == Array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<IOSchema>>,
    /// Field schemas, present when `kind == Object`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, IOSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl IOSchema {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

/// A single option in a `ParamSchema::Select` declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// The editor-facing declaration of a node parameter.
///
/// Unlike `IOSchema` (which describes data flowing through ports),
/// `ParamSchema` describes a single configuration field rendered in the
/// graph editor's node inspector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamSchema {
    String {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        required: bool,
    },
    Number {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Boolean {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        required: bool,
    },
    Select {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        required: bool,
        options: Vec<SelectOption>,
    },
    Secret {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        required: bool,
    },
    Json {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        required: bool,
    },
}
