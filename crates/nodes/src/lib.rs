//! `nodes` crate — the `ExecutableNode` trait and built-in node implementations.
//!
//! Every node — built-in and plugin alike — must implement [`ExecutableNode`].
//! The engine crate dispatches execution through this trait object, resolved
//! by id out of a [`NodeRegistry`].

pub mod builtin;
pub mod error;
pub mod mock;
pub mod registry;
pub mod schema;
pub mod traits;

pub use builtin::register_builtin_nodes;
pub use error::NodeError;
pub use registry::{CatalogEntry, NodeDefinition, NodeDisplay, NodeRegistry};
pub use schema::{IOSchema, ParamSchema, SelectOption, ValueKind};
pub use traits::{CancellationToken, ExecutableNode, ExecutionContext, ExecutionLogSink, NullLogSink, PortMap};
