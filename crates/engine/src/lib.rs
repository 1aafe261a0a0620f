//! `engine` crate — the DSL model, DAG validator, parameter resolver, and
//! workflow executor. Persistence (`db`, `queue`) and the worker's poll loop
//! are deliberately not dependencies of this crate: the executor is handed
//! everything it needs (a DSL, inputs, secrets, a log sink) by its caller.

pub mod dag;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod models;
pub mod resolver;

pub use dag::validate_dag;
pub use dsl::{Edge, Node, ParamValue, WorkflowDsl, WorkflowMeta, CURRENT_DSL_VERSION};
pub use error::EngineError;
pub use executor::{derive_outputs, RunHooks, WorkflowExecutor};
pub use models::ExecutionState;

#[cfg(test)]
mod executor_tests;
