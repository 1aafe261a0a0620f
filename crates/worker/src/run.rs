//! The worker poll loop: find pending executions, claim, run, finalize.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use db::models::ExecutionRow;
use engine::dsl::WorkflowDsl;
use engine::executor::{derive_outputs, RunHooks, WorkflowExecutor};
use nodes::{register_builtin_nodes, CancellationToken, NodeRegistry};
use queue::{Queue, QueueError};

use crate::config::WorkerConfig;
use crate::log_sink::QueueLogSink;

/// Run the poll/claim/execute/finalize loop until a termination signal
/// arrives. Each poll's batch of claimed executions runs concurrently; each
/// individual run is internally sequential (the engine's own invariant).
pub async fn run_loop(config: WorkerConfig) -> anyhow::Result<()> {
    let pool = db::pool::create_pool(&config.database_url, 10).await?;
    let queue = Arc::new(Queue::new(pool));
    let registry = Arc::new(NodeRegistry::new());
    register_builtin_nodes(&registry);

    let worker_id = format!("worker-{}", Uuid::new_v4());
    info!(
        worker_id,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        batch_size = config.batch_size,
        "worker starting"
    );

    let mut shutdown = Box::pin(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(worker_id, "shutdown signal received, exiting");
                break;
            }
            result = poll_once(&queue, &registry, &worker_id, config.batch_size) => {
                if let Err(e) = result {
                    error!(worker_id, "poll failed: {e}");
                }
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!(worker_id, "shutdown signal received, exiting");
                break;
            }
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }

    Ok(())
}

/// One polling cycle: fetch a batch of pending executions and run every one
/// of them concurrently. A claim lost to another worker is tolerated
/// silently; every other failure finalizes the row as `error`.
async fn poll_once(queue: &Arc<Queue>, registry: &Arc<NodeRegistry>, worker_id: &str, batch_size: i64) -> anyhow::Result<()> {
    let batch = queue.find_pending(batch_size).await?;
    if batch.is_empty() {
        return Ok(());
    }

    let mut handles = Vec::with_capacity(batch.len());
    for execution in batch {
        let queue = queue.clone();
        let registry = registry.clone();
        let worker_id = worker_id.to_string();
        handles.push(tokio::spawn(async move {
            process_execution(&queue, &registry, &worker_id, execution).await;
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!("execution task panicked: {e}");
        }
    }

    Ok(())
}

#[instrument(skip(queue, registry), fields(execution_id = %execution.id))]
async fn process_execution(queue: &Arc<Queue>, registry: &Arc<NodeRegistry>, worker_id: &str, execution: ExecutionRow) {
    let claimed = match queue.claim(execution.id, worker_id).await {
        Ok(row) => row,
        Err(QueueError::ClaimLost) => {
            warn!(execution_id = %execution.id, "claim lost to another worker");
            return;
        }
        Err(e) => {
            error!(execution_id = %execution.id, "claim failed: {e}");
            return;
        }
    };

    if let Err(e) = run_claimed(queue, registry, claimed).await {
        error!("execution run bookkeeping failed: {e}");
    }
}

async fn run_claimed(queue: &Arc<Queue>, registry: &Arc<NodeRegistry>, execution: ExecutionRow) -> anyhow::Result<()> {
    let version = db::repository::workflows::get_version(queue.pool(), execution.version_id).await?;
    let dsl: WorkflowDsl = serde_json::from_value(version.definition)?;

    let sink = Arc::new(QueueLogSink::new(queue.clone(), execution.workflow_id, execution.id));
    let executor = WorkflowExecutor::new(registry.clone());

    let run_result = executor
        .run(
            &dsl,
            execution.id,
            Some(execution.workflow_id),
            execution.inputs.clone(),
            std::collections::HashMap::new(),
            CancellationToken::new(),
            sink,
            RunHooks::default(),
        )
        .await;

    match run_result {
        Ok(state) if state.error.is_none() => {
            let outputs = derive_outputs(&dsl, &state);
            let outputs_json = serde_json::to_value(outputs)?;
            queue.mark_completed(execution.id, outputs_json).await?;
        }
        Ok(state) => {
            let message = state.error.unwrap_or_else(|| "unknown error".to_string());
            queue.mark_failed(execution.id, &message).await?;
        }
        Err(e) => {
            queue.mark_failed(execution.id, &e.to_string()).await?;
        }
    }

    Ok(())
}
