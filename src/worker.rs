//! Parallel document processing.
//!
//! Detection is CPU-bound, so documents fan out across a pool of OS
//! worker threads. Every worker builds its own extractor and detector
//! on startup and owns them for its lifetime; nothing detection-related
//! is shared across workers. Job and result channels are bounded, so a
//! slow consumer exerts backpressure instead of buffering findings
//! without limit.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info};

use crate::detect::Detector;
use crate::extract::PageSource;
use crate::models::FindingDraft;
use crate::pipeline::{process_document, PipelineError, PipelineOutcome};

/// Documents handed to the pool per submission chunk.
pub const CHUNK_SIZE: usize = 100;

/// One unit of work: a document to process.
#[derive(Debug, Clone)]
pub struct WorkerJob {
    pub doc_id: String,
    pub filepath: PathBuf,
}

/// Why a document failed.
#[derive(Debug, Clone)]
pub enum FailReason {
    ExtractFail(String),
    Internal(String),
}

/// Per-document outcome reported to the result callback.
#[derive(Debug)]
pub enum JobOutcome {
    Completed {
        page_count: u32,
        findings: Vec<FindingDraft>,
    },
    Failed(FailReason),
    Cancelled,
}

/// Builds a fresh page source for each worker.
pub type EngineFactory = Arc<dyn Fn() -> Box<dyn PageSource> + Send + Sync>;

/// Clamp a requested worker count to `[1, cores - 1]`, floor 1.
pub fn clamp_worker_count(requested: usize) -> usize {
    let ceiling = thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1);
    requested.clamp(1, ceiling)
}

/// A pool bound to one scan: fixed worker count, threshold, and cancel
/// flag.
pub struct WorkerPool {
    worker_count: usize,
    chunk_size: usize,
    confidence_threshold: f64,
    engine_factory: EngineFactory,
    cancel: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        worker_count: usize,
        chunk_size: usize,
        confidence_threshold: f64,
        engine_factory: EngineFactory,
    ) -> Self {
        Self {
            worker_count: clamp_worker_count(worker_count),
            chunk_size: chunk_size.max(1),
            confidence_threshold,
            engine_factory,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an externally owned cancel flag instead of the pool's own,
    /// so a controller can signal cancellation without holding the
    /// pool itself.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Shared cancel flag; also consulted by pipelines between pages.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Request cooperative cancellation. In-flight documents finish
    /// their current page; queued documents return promptly.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Process `jobs`, invoking `on_result` for each dispatched
    /// document as it completes (in arbitrary order). Returns only
    /// after every worker has stopped. Jobs not yet dispatched when
    /// cancellation lands produce no callback at all.
    pub fn run(&self, jobs: Vec<WorkerJob>, mut on_result: impl FnMut(String, JobOutcome)) {
        if jobs.is_empty() {
            return;
        }

        let (job_tx, job_rx) = bounded::<WorkerJob>(self.chunk_size);
        let (result_tx, result_rx) = bounded::<(String, JobOutcome)>(self.chunk_size * 2);

        let mut workers = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let factory = Arc::clone(&self.engine_factory);
            let cancel = Arc::clone(&self.cancel);
            let threshold = self.confidence_threshold;

            workers.push(thread::spawn(move || {
                run_worker(worker_id, job_rx, result_tx, factory, cancel, threshold);
            }));
        }
        drop(job_rx);
        drop(result_tx);

        // Feed jobs from a separate thread; bounded send blocks, which
        // is what paces submission.
        let cancel = Arc::clone(&self.cancel);
        let feeder = thread::spawn(move || {
            for job in jobs {
                if cancel.load(Ordering::Relaxed) {
                    debug!("cancellation observed, not dispatching remaining jobs");
                    break;
                }
                if job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        for (doc_id, outcome) in result_rx.iter() {
            on_result(doc_id, outcome);
        }

        let _ = feeder.join();
        for (i, worker) in workers.into_iter().enumerate() {
            if worker.join().is_err() {
                error!("worker {} terminated abnormally", i);
            }
        }
        info!("worker pool drained");
    }
}

fn run_worker(
    worker_id: usize,
    job_rx: Receiver<WorkerJob>,
    result_tx: Sender<(String, JobOutcome)>,
    factory: EngineFactory,
    cancel: Arc<AtomicBool>,
    threshold: f64,
) {
    debug!("worker {} starting", worker_id);

    // Per-worker engines, built once and amortised across the
    // worker's jobs.
    let source = factory();
    let detector = Detector::new();

    for job in job_rx.iter() {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            process_document(
                source.as_ref(),
                &detector,
                &job.filepath,
                threshold,
                &cancel,
            )
        }));

        let outcome = match outcome {
            Ok(Ok(PipelineOutcome::Completed {
                page_count,
                findings,
            })) => JobOutcome::Completed {
                page_count,
                findings,
            },
            Ok(Ok(PipelineOutcome::Cancelled)) => JobOutcome::Cancelled,
            Ok(Err(PipelineError::ExtractFail(detail))) => {
                JobOutcome::Failed(FailReason::ExtractFail(detail))
            }
            Ok(Err(PipelineError::Internal(detail))) => {
                JobOutcome::Failed(FailReason::Internal(detail))
            }
            Err(_) => {
                error!("worker {} panicked on a document, continuing", worker_id);
                JobOutcome::Failed(FailReason::Internal("worker panic".to_string()))
            }
        };

        if result_tx.send((job.doc_id, outcome)).is_err() {
            break;
        }
    }

    debug!("worker {} stopped", worker_id);
}
