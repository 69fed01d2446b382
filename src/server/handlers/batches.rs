//! Scan and batch endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::models::Batch;

use super::super::{ApiError, AppState};
use super::blocking;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub source_path: String,
    pub confidence_threshold: Option<f64>,
    pub worker_count: Option<usize>,
}

/// POST /api/scan: inventory a folder and start scanning it.
pub async fn start_scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<Batch>, ApiError> {
    if let Some(threshold) = req.confidence_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ApiError::BadRequest(format!(
                "confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }
    }

    let batch = state
        .batches
        .start_scan(&req.source_path, req.confidence_threshold, req.worker_count)
        .await?;
    Ok(Json(batch))
}

/// GET /api/batches: all batches, newest first.
pub async fn list_batches(State(state): State<AppState>) -> Result<Json<Vec<Batch>>, ApiError> {
    let store = state.store;
    let batches = blocking(move || store.list_batches()).await?;
    Ok(Json(batches))
}

/// GET /api/batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Batch>, ApiError> {
    let store = state.store;
    let batch = blocking(move || store.get_batch(&id)).await?;
    Ok(Json(batch))
}

/// POST /api/batches/{id}/resume: re-dispatch unprocessed documents.
pub async fn resume_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.batches.resume(&id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /api/batches/{id}: cancel any in-flight scan, then delete
/// with cascade.
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.batches.delete_batch(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
