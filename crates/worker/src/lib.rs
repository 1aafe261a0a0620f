//! `worker` crate — the background poller that turns queued executions into
//! engine runs.
//!
//! Polls `queue` in batches, claims executions, runs each via `engine`, and
//! writes results and per-node logs back through `queue`/`db`.

pub mod config;
pub mod log_sink;
pub mod run;

pub use config::WorkerConfig;
pub use log_sink::QueueLogSink;
pub use run::run_loop;
