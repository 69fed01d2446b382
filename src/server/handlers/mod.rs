//! Request handlers for the dashboard API.

mod batches;
mod documents;
mod reports;
mod stats;

pub use batches::{delete_batch, get_batch, list_batches, resume_batch, start_scan};
pub use documents::{get_document, list_documents, list_findings};
pub use reports::{download_report, generate_report, get_report};
pub use stats::{get_pii_types, get_stats};

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::repository::{Page, RepositoryError};

/// Default page size for listings.
pub(crate) const DEFAULT_PAGE_SIZE: u64 = 50;

/// Hard ceiling for page size.
pub(crate) const MAX_PAGE_SIZE: u64 = 500;

/// Common pagination query parameters; `page` is 1-based.
#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub pii_type: Option<String>,
    pub min_confidence: Option<f64>,
    pub has_findings: Option<bool>,
}

impl PageParams {
    /// Clamped `(page, page_size)` after validating filters.
    pub fn normalize(&self) -> Result<(u64, u64), ApiError> {
        if let Some(c) = self.min_confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(ApiError::BadRequest(format!(
                    "min_confidence must be within [0, 1], got {c}"
                )));
            }
        }
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Ok((page, page_size))
    }
}

/// Paginated JSON envelope.
#[derive(Debug, Serialize)]
pub(crate) struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Paginated<T> {
    pub fn from_page(page_data: Page<T>, page: u64, page_size: u64) -> Self {
        Self {
            items: page_data.items,
            total: page_data.total,
            page,
            page_size,
        }
    }
}

/// Run a blocking store operation off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RepositoryError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| ApiError::Internal("storage task panicked".to_string()))?
        .map_err(ApiError::from)
}
