//! `api` crate — illustrative HTTP REST gateway.
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   POST   /api/v1/validate
//!   POST   /webhook/:path
//!
//! This gateway, OIDC auth, and the graph editor are external collaborators
//! of the execution subsystem proper — this crate is the illustrative
//! surface described by the engine's external-interface contract, not a
//! hardened production API.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use db::DbPool;
use nodes::NodeRegistry;
use queue::Queue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub queue: Arc<Queue>,
    pub registry: Arc<NodeRegistry>,
}

pub async fn serve(bind: &str, pool: DbPool) -> Result<(), std::io::Error> {
    let registry = Arc::new(NodeRegistry::new());
    nodes::register_builtin_nodes(&registry);

    let state = AppState {
        queue: Arc::new(Queue::new(pool.clone())),
        pool,
        registry,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute))
        .route("/validate", post(handlers::workflows::validate));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/webhook/:path", post(handlers::webhooks::handle_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
