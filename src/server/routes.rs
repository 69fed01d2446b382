//! Router configuration for the dashboard API.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the router with all API routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scan", post(handlers::start_scan))
        .route("/api/batches", get(handlers::list_batches))
        .route("/api/batches/{id}", get(handlers::get_batch))
        .route("/api/batches/{id}", delete(handlers::delete_batch))
        .route("/api/batches/{id}/resume", post(handlers::resume_batch))
        .route("/api/batches/{id}/documents", get(handlers::list_documents))
        .route("/api/documents/{id}", get(handlers::get_document))
        .route("/api/documents/{id}/findings", get(handlers::list_findings))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/pii-types", get(handlers::get_pii_types))
        .route("/api/reports/generate", post(handlers::generate_report))
        .route("/api/reports/{id}", get(handlers::get_report))
        .route("/api/reports/{id}/download", get(handlers::download_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
