//! Document and finding endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::models::{Document, Finding};
use crate::repository::{DocumentFilter, FindingFilter};

use super::super::{ApiError, AppState};
use super::{blocking, PageParams, Paginated};

/// GET /api/batches/{id}/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Document>>, ApiError> {
    let (page, page_size) = params.normalize()?;
    let filter = DocumentFilter {
        pii_type: params.pii_type.clone(),
        min_confidence: params.min_confidence,
        has_findings: params.has_findings,
    };

    let store = state.store;
    let result =
        blocking(move || store.list_documents(&batch_id, &filter, page, page_size)).await?;
    Ok(Json(Paginated::from_page(result, page, page_size)))
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let store = state.store;
    let document = blocking(move || store.get_document(&id)).await?;
    Ok(Json(document))
}

/// GET /api/documents/{id}/findings
pub async fn list_findings(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Finding>>, ApiError> {
    let (page, page_size) = params.normalize()?;
    let filter = FindingFilter {
        pii_type: params.pii_type.clone(),
        min_confidence: params.min_confidence,
    };

    let store = state.store;
    let result = blocking(move || store.list_findings(&doc_id, &filter, page, page_size)).await?;
    Ok(Json(Paginated::from_page(result, page, page_size)))
}
