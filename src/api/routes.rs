//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use crate::api::handlers;
use crate::api::handlers::AppState;

/// Build the API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/compare", post(handlers::compare))
        .route("/documents", get(handlers::list_documents))
        .route("/stats", get(handlers::stats))
        .with_state(state)
}
