//! Batch lifecycle: inventory, dispatch, progress, resume, cancel.
//!
//! One background task runs per active scan. The task drives a worker
//! pool over the batch's unprocessed documents and persists each
//! result (with exact counters) as it arrives. The registry of
//! in-flight scans is the only mutable process-wide state besides the
//! store itself.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Settings;
use crate::extract::Extractor;
use crate::models::{Batch, BatchStatus, DocumentStatus};
use crate::repository::{RepositoryError, Store};
use crate::worker::{EngineFactory, FailReason, JobOutcome, WorkerJob, WorkerPool};

#[derive(Debug, Error)]
pub enum BatchError {
    /// Source path missing or not a directory.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

struct ActiveScan {
    cancel: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

struct Inner {
    store: Arc<Store>,
    settings: Settings,
    engine_factory: EngineFactory,
    active: Mutex<HashMap<String, ActiveScan>>,
}

/// Owns batch scans. Cheap to clone; all clones share the registry.
#[derive(Clone)]
pub struct BatchManager {
    inner: Arc<Inner>,
}

impl BatchManager {
    /// Manager with the real Poppler/Tesseract extractor.
    pub fn new(store: Arc<Store>, settings: Settings) -> Self {
        let factory_settings = settings.clone();
        let engine_factory: EngineFactory =
            Arc::new(move || Box::new(Extractor::new(&factory_settings)));
        Self::with_engine_factory(store, settings, engine_factory)
    }

    /// Manager with a custom page source, used by tests.
    pub fn with_engine_factory(
        store: Arc<Store>,
        settings: Settings,
        engine_factory: EngineFactory,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                settings,
                engine_factory,
                active: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Inventory a folder and start scanning it. Returns as soon as
    /// the batch and its document rows exist; processing continues on
    /// a background task.
    pub async fn start_scan(
        &self,
        source_path: &str,
        confidence_threshold: Option<f64>,
        worker_count: Option<usize>,
    ) -> Result<Batch, BatchError> {
        let inner = Arc::clone(&self.inner);
        let source_path = source_path.to_string();

        let (batch, has_work) = tokio::task::spawn_blocking(move || {
            let folder = Path::new(&source_path)
                .canonicalize()
                .map_err(|_| BatchError::InvalidPath(source_path.clone()))?;
            if !folder.is_dir() {
                return Err(BatchError::InvalidPath(source_path.clone()));
            }

            let name = folder
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| folder.display().to_string());

            let files = inventory_pdfs(&folder);
            info!(batch = %name, count = files.len(), "inventoried source folder");

            let batch = inner.store.create_batch_with_documents(
                &name,
                &folder.to_string_lossy(),
                &files,
            )?;

            if files.is_empty() {
                inner
                    .store
                    .set_batch_status(&batch.id, BatchStatus::Completed)?;
            }

            let batch = inner.store.get_batch(&batch.id)?;
            Ok((batch, !files.is_empty()))
        })
        .await
        .expect("inventory task must not panic")?;

        if has_work {
            self.spawn_scan(batch.id.clone(), confidence_threshold, worker_count);
        }

        Ok(batch)
    }

    /// Re-dispatch a batch's `pending` and `error` documents. Already
    /// completed documents are skipped. No-op if the batch is already
    /// being processed.
    pub async fn resume(&self, batch_id: &str) -> Result<(), BatchError> {
        // Existence check surfaces NotFound before any task spawns.
        let inner = Arc::clone(&self.inner);
        let id = batch_id.to_string();
        tokio::task::spawn_blocking(move || inner.store.get_batch(&id).map(|_| ()))
            .await
            .expect("lookup task must not panic")?;

        if self.inner.active.lock().unwrap().contains_key(batch_id) {
            warn!(batch_id, "resume requested for already-active batch");
            return Ok(());
        }

        self.spawn_scan(batch_id.to_string(), None, None);
        Ok(())
    }

    /// Signal cancellation and wait for the scan's workers to drain.
    /// Documents that were in flight stay `pending` for a later resume.
    pub async fn cancel_batch(&self, batch_id: &str) {
        let entry = self.inner.active.lock().unwrap().remove(batch_id);
        if let Some(scan) = entry {
            info!(batch_id, "cancelling batch");
            scan.cancel.store(true, Ordering::Relaxed);
            if scan.task.await.is_err() {
                error!(batch_id, "scan task ended abnormally during cancel");
            }
        }
    }

    /// Cancel any in-flight scan for the batch, then delete it (the
    /// store cascades to documents and findings).
    pub async fn delete_batch(&self, batch_id: &str) -> Result<(), BatchError> {
        self.cancel_batch(batch_id).await;

        let inner = Arc::clone(&self.inner);
        let id = batch_id.to_string();
        tokio::task::spawn_blocking(move || inner.store.delete_batch(&id))
            .await
            .expect("delete task must not panic")?;
        Ok(())
    }

    /// True while a scan task is registered for the batch.
    pub fn is_active(&self, batch_id: &str) -> bool {
        self.inner.active.lock().unwrap().contains_key(batch_id)
    }

    fn spawn_scan(
        &self,
        batch_id: String,
        confidence_threshold: Option<f64>,
        worker_count: Option<usize>,
    ) {
        let cancel = Arc::new(AtomicBool::new(false));
        let inner = Arc::clone(&self.inner);
        let flag = Arc::clone(&cancel);
        let id = batch_id.clone();

        let task = tokio::spawn(async move {
            let run_inner = Arc::clone(&inner);
            let run_id = id.clone();
            let run_flag = Arc::clone(&flag);

            let joined = tokio::task::spawn_blocking(move || {
                run_scan(
                    &run_inner,
                    &run_id,
                    confidence_threshold,
                    worker_count,
                    run_flag,
                )
            })
            .await;

            if joined.is_err() {
                error!(batch_id = %id, "scan task panicked");
                let _ = inner.store.set_batch_status(&id, BatchStatus::Error);
            }

            inner.active.lock().unwrap().remove(&id);
        });

        self.inner
            .active
            .lock()
            .unwrap()
            .insert(batch_id, ActiveScan { cancel, task });
    }
}

/// The blocking body of one scan: claim work, run the pool, persist
/// each result, settle the final batch status.
fn run_scan(
    inner: &Inner,
    batch_id: &str,
    confidence_threshold: Option<f64>,
    worker_count: Option<usize>,
    cancel: Arc<AtomicBool>,
) {
    let store = &inner.store;

    let docs = match store.resumable_documents(batch_id) {
        Ok(docs) => docs,
        Err(e) => {
            error!(batch_id, "failed to load work list: {}", e);
            return;
        }
    };

    if docs.is_empty() {
        let _ = store.set_batch_status(batch_id, BatchStatus::Completed);
        return;
    }

    if let Err(e) = store.set_batch_status(batch_id, BatchStatus::Processing) {
        error!(batch_id, "failed to mark batch processing: {}", e);
        return;
    }

    let jobs: Vec<WorkerJob> = docs
        .into_iter()
        .map(|(doc_id, filepath)| WorkerJob {
            doc_id,
            filepath: filepath.into(),
        })
        .collect();

    info!(batch_id, jobs = jobs.len(), "dispatching batch");

    let threshold = confidence_threshold.unwrap_or(inner.settings.confidence_threshold);
    let workers = worker_count.unwrap_or(inner.settings.worker_count);
    let pool = WorkerPool::new(
        workers,
        inner.settings.chunk_size,
        threshold,
        Arc::clone(&inner.engine_factory),
    )
    .with_cancel_flag(Arc::clone(&cancel));

    let mut storage_failed = false;

    pool.run(jobs, |doc_id, outcome| {
        let result = match outcome {
            JobOutcome::Completed {
                page_count,
                findings,
            } => store.record_document_result(
                &doc_id,
                page_count,
                DocumentStatus::Completed,
                &findings,
            ),
            JobOutcome::Failed(reason) => {
                match &reason {
                    FailReason::ExtractFail(detail) => {
                        warn!(%doc_id, "document unreadable: {}", detail)
                    }
                    FailReason::Internal(detail) => {
                        error!(%doc_id, "document failed: {}", detail)
                    }
                }
                store.record_document_result(&doc_id, 0, DocumentStatus::Error, &[])
            }
            // Cancelled documents stay pending for the next resume.
            JobOutcome::Cancelled => return,
        };

        if let Err(e) = result {
            error!(%doc_id, "failed to persist result: {}", e);
            storage_failed = true;
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let final_status = if storage_failed {
        Some(BatchStatus::Error)
    } else if cancel.load(Ordering::Relaxed) {
        // Cancelled mid-flight: stay `processing` so the batch is
        // visibly incomplete and resumable.
        None
    } else {
        Some(BatchStatus::Completed)
    };

    if let Some(status) = final_status {
        if let Err(e) = store.set_batch_status(batch_id, status) {
            error!(batch_id, "failed to settle batch status: {}", e);
        }
        info!(batch_id, status = status.as_str(), "batch settled");
    }
}

/// Recursively find `*.pdf` files under `root`, case-insensitive on
/// the extension, deduplicated case-insensitively on the canonical
/// path (two directory entries on a case-insensitive filesystem can
/// name the same file). Sorted by filename for stable claim order.
fn inventory_pdfs(root: &Path) -> Vec<(String, String)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            continue;
        }

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dedupe_key = canonical.to_string_lossy().to_lowercase();
        if !seen.insert(dedupe_key) {
            continue;
        }

        let filename = canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push((filename, canonical.to_string_lossy().into_owned()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    files
}
