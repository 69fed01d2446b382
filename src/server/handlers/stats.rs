//! Dashboard statistics endpoints.

use axum::extract::State;
use axum::Json;

use crate::repository::{GlobalStats, PiiTypeStat};

use super::super::{ApiError, AppState};
use super::blocking;

/// GET /api/stats: global counters.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<GlobalStats>, ApiError> {
    let store = state.store;
    let stats = blocking(move || store.global_stats()).await?;
    Ok(Json(stats))
}

/// GET /api/pii-types: per-type counts and mean confidence.
pub async fn get_pii_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<PiiTypeStat>>, ApiError> {
    let store = state.store;
    let stats = blocking(move || store.pii_type_distribution()).await?;
    Ok(Json(stats))
}
