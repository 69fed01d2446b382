//! Report endpoints: request generation, poll status, download.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::reports::{ReportFormat, ReportMeta};

use super::super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub batch_id: String,
    pub format: ReportFormat,
}

/// POST /api/reports/generate
pub async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ReportMeta>, ApiError> {
    let meta = state.reports.generate(&req.batch_id, req.format).await?;
    Ok(Json(meta))
}

/// GET /api/reports/{id}: status of a requested report.
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReportMeta>, ApiError> {
    state.reports.get(&id).map(Json).ok_or(ApiError::NotFound)
}

/// GET /api/reports/{id}/download: stream the generated file.
pub async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let (path, filename, content_type) = state.reports.download(&id)?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("report file unreadable: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}
