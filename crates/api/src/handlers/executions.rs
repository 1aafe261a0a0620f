use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use super::AppState;
use db::repository::workflows as wf_repo;

#[derive(serde::Deserialize)]
pub struct ExecuteWorkflowDto {
    pub input: Value,
}

/// Enqueue an execution of a workflow's current version. The worker picks it
/// up asynchronously; this endpoint only confirms the row was created.
pub async fn execute(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<ExecuteWorkflowDto>,
) -> Result<(StatusCode, Json<db::models::ExecutionRow>), StatusCode> {
    let version = match wf_repo::get_current_version(&state.pool, id).await {
        Ok(v) => v,
        Err(db::DbError::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    match state.queue.enqueue(id, version.id, payload.input).await {
        Ok(execution) => Ok((StatusCode::ACCEPTED, Json(execution))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
