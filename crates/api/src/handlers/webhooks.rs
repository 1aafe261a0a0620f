use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::AppState;
use db::repository::workflows as wf_repo;

/// Find a workflow whose name matches the webhook path and enqueue an
/// execution of its current version with the request body as inputs.
///
/// Webhook routing proper (a dedicated trigger type on the DSL) is a gateway
/// concern outside this engine's scope; matching on workflow name is this
/// illustrative surface's stand-in.
pub async fn handle_webhook(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let workflows = match wf_repo::list_workflows(&state.pool).await {
        Ok(wfs) => wfs,
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let matched = workflows.into_iter().find(|w| w.name == path).ok_or(StatusCode::NOT_FOUND)?;

    let version = match wf_repo::get_current_version(&state.pool, matched.id).await {
        Ok(v) => v,
        Err(db::DbError::NotFound) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    state
        .queue
        .enqueue(matched.id, version.id, payload)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({"message": "webhook accepted"}))))
}
