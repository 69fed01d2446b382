//! Report generation: CSV exports and PDF summaries for a batch.
//!
//! Generation runs on a background task. An in-process registry maps
//! report ids to their status (`generating` → `completed` | `failed`);
//! files land under `<data_dir>/reports/`.

mod csv_export;
mod pdf_report;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::models::new_id;
use crate::repository::{RepositoryError, Store};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report not found")]
    NotFound,

    #[error("report is not ready (status: {0})")]
    NotReady(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Csv => "text/csv",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
}

impl ReportStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Generating => "generating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Registry entry for one requested report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub id: String,
    pub batch_id: String,
    pub format: ReportFormat,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub filename: Option<String>,
    #[serde(skip)]
    filepath: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Inner {
    store: Arc<Store>,
    reports_dir: PathBuf,
    registry: Mutex<HashMap<String, ReportMeta>>,
}

/// Tracks and generates reports. Clones share the registry.
#[derive(Clone)]
pub struct ReportManager {
    inner: Arc<Inner>,
}

impl ReportManager {
    pub fn new(store: Arc<Store>, reports_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                reports_dir,
                registry: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start generating a report for a batch. Returns the registry
    /// entry immediately; the file is written on a background task.
    pub async fn generate(
        &self,
        batch_id: &str,
        format: ReportFormat,
    ) -> Result<ReportMeta, ReportError> {
        // Fail fast if the batch does not exist.
        let inner = Arc::clone(&self.inner);
        let id = batch_id.to_string();
        let batch = tokio::task::spawn_blocking(move || inner.store.get_batch(&id))
            .await
            .expect("lookup task must not panic")?;

        let meta = ReportMeta {
            id: new_id(),
            batch_id: batch_id.to_string(),
            format,
            status: ReportStatus::Generating,
            created_at: Utc::now(),
            filename: None,
            filepath: None,
            error: None,
        };
        self.inner
            .registry
            .lock()
            .unwrap()
            .insert(meta.id.clone(), meta.clone());

        let inner = Arc::clone(&self.inner);
        let report_id = meta.id.clone();
        let batch_name = batch.name.clone();
        tokio::task::spawn_blocking(move || {
            let filename = format!(
                "RedactQC_{}_{}.{}",
                sanitize_name(&batch_name),
                &batch.id[..8.min(batch.id.len())],
                format.extension()
            );
            let path = inner.reports_dir.join(&filename);

            let result = match format {
                ReportFormat::Csv => csv_export::write_csv(&inner.store, &batch, &path),
                ReportFormat::Pdf => pdf_report::write_pdf(&inner.store, &batch, &path),
            };

            let mut registry = inner.registry.lock().unwrap();
            let Some(entry) = registry.get_mut(&report_id) else {
                return;
            };
            match result {
                Ok(()) => {
                    info!(%report_id, %filename, "report generated");
                    entry.status = ReportStatus::Completed;
                    entry.filename = Some(filename);
                    entry.filepath = Some(path);
                }
                Err(e) => {
                    error!(%report_id, "report generation failed: {}", e);
                    entry.status = ReportStatus::Failed;
                    entry.error = Some(e.to_string());
                }
            }
        });

        Ok(meta)
    }

    pub fn get(&self, report_id: &str) -> Option<ReportMeta> {
        self.inner.registry.lock().unwrap().get(report_id).cloned()
    }

    /// Path and download metadata for a completed report.
    pub fn download(
        &self,
        report_id: &str,
    ) -> Result<(PathBuf, String, &'static str), ReportError> {
        let meta = self.get(report_id).ok_or(ReportError::NotFound)?;
        if meta.status != ReportStatus::Completed {
            return Err(ReportError::NotReady(meta.status.as_str()));
        }
        let path = meta.filepath.ok_or(ReportError::NotFound)?;
        let filename = meta.filename.unwrap_or_else(|| "report".to_string());
        Ok((path, filename, meta.format.content_type()))
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[derive(Debug, Error)]
pub(crate) enum GenerateError {
    #[error("storage: {0}")]
    Repository(#[from] RepositoryError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),
}
