use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use engine::dsl::WorkflowDsl;

use super::AppState;
use db::repository::workflows as wf_repo;

#[derive(serde::Deserialize)]
pub struct CreateWorkflowDto {
    pub name: String,
    pub definition: Value,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub execution_order: Option<Vec<String>>,
}

/// Validate a DSL document without persisting it — structural checks
/// (`engine::dsl::validate`) plus the DAG validator/orderer, run against the
/// shared node registry.
pub async fn validate(State(state): State<AppState>, Json(definition): Json<Value>) -> (StatusCode, Json<ValidationResponse>) {
    let dsl: WorkflowDsl = match serde_json::from_value(definition) {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidationResponse {
                    valid: false,
                    errors: vec![format!("malformed DSL: {e}")],
                    execution_order: None,
                }),
            )
        }
    };

    let structural = engine::dsl::validate(&dsl);
    if !structural.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidationResponse {
                valid: false,
                errors: structural.into_iter().map(|e| format!("{}: {}", e.path, e.message)).collect(),
                execution_order: None,
            }),
        );
    }

    match engine::dag::validate_dag(&dsl, &state.registry.type_ids()) {
        Ok(order) => (
            StatusCode::OK,
            Json(ValidationResponse {
                valid: true,
                errors: Vec::new(),
                execution_order: Some(order),
            }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationResponse {
                valid: false,
                errors: vec![e.to_string()],
                execution_order: None,
            }),
        ),
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<db::models::WorkflowRow>>, StatusCode> {
    match wf_repo::list_workflows(&state.pool).await {
        Ok(workflows) => Ok(Json(workflows)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn get(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<db::models::WorkflowRow>, StatusCode> {
    match wf_repo::get_workflow(&state.pool, id).await {
        Ok(wf) => Ok(Json(wf)),
        Err(db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowDto>,
) -> Result<(StatusCode, Json<db::models::WorkflowRow>), StatusCode> {
    let dsl: WorkflowDsl = serde_json::from_value(payload.definition.clone()).map_err(|_| StatusCode::BAD_REQUEST)?;

    let structural = engine::dsl::validate(&dsl);
    if !structural.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if engine::dag::validate_dag(&dsl, &state.registry.type_ids()).is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match wf_repo::create_workflow(&state.pool, &payload.name, &dsl.dsl_version, payload.definition).await {
        Ok((workflow, _version)) => Ok((StatusCode::CREATED, Json(workflow))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub async fn delete(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, StatusCode> {
    match wf_repo::delete_workflow(&state.pool, id).await {
        Ok(_) => Ok(StatusCode::NO_CONTENT),
        Err(db::DbError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
