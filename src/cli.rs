//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::BatchManager;
use crate::config::Settings;
use crate::models::BatchStatus;
use crate::reports::{ReportFormat, ReportStatus};
use crate::repository::Store;
use crate::server;

#[derive(Parser)]
#[command(name = "redact-qc")]
#[command(about = "Offline QA scanner for redacted legal PDF documents")]
#[command(version)]
pub struct Cli {
    /// Data directory (default: platform user-data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Scan a folder of PDFs and wait for completion
    Scan {
        /// Folder containing the PDFs to check
        folder: PathBuf,
        /// Minimum confidence for recorded findings
        #[arg(short = 't', long)]
        threshold: Option<f64>,
        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Resume an interrupted batch
    Resume {
        /// Batch id to resume
        batch_id: String,
    },

    /// List all batches
    Batches,

    /// Start the dashboard server (127.0.0.1 only)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Generate a findings report for a batch
    Report {
        /// Batch id to report on
        batch_id: String,
        /// Output format: csv or pdf
        #[arg(long, default_value = "csv")]
        format: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::default();
    if let Some(data_dir) = cli.data_dir {
        settings = Settings::with_data_dir(data_dir);
    }

    match cli.command {
        Commands::Init => init(&settings),
        Commands::Scan {
            folder,
            threshold,
            workers,
        } => scan(&settings, &folder, threshold, workers).await,
        Commands::Resume { batch_id } => resume(&settings, &batch_id).await,
        Commands::Batches => list_batches(&settings),
        Commands::Serve { port } => server::serve(&settings, port).await,
        Commands::Report { batch_id, format } => report(&settings, &batch_id, &format).await,
    }
}

fn open_store(settings: &Settings) -> anyhow::Result<Arc<Store>> {
    settings.ensure_dirs()?;
    Ok(Arc::new(Store::open(&settings.database_path())?))
}

fn init(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    println!(
        "{} database at {}",
        style("Initialized").green().bold(),
        store.database_path().display()
    );
    Ok(())
}

async fn scan(
    settings: &Settings,
    folder: &std::path::Path,
    threshold: Option<f64>,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let manager = BatchManager::new(Arc::clone(&store), settings.clone());

    let batch = manager
        .start_scan(&folder.to_string_lossy(), threshold, workers)
        .await?;
    println!(
        "Batch {} over {} documents",
        style(&batch.id[..8]).cyan(),
        batch.total_docs
    );

    let finished = watch_progress(&store, &batch.id).await?;

    println!(
        "{}: {} processed, {} with findings",
        style("Scan complete").green().bold(),
        finished.processed_docs,
        finished.docs_with_findings
    );
    Ok(())
}

async fn resume(settings: &Settings, batch_id: &str) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let manager = BatchManager::new(Arc::clone(&store), settings.clone());

    manager.resume(batch_id).await?;
    let finished = watch_progress(&store, batch_id).await?;

    println!(
        "{}: {} of {} processed",
        style("Resume complete").green().bold(),
        finished.processed_docs,
        finished.total_docs
    );
    Ok(())
}

/// Render a progress bar until the batch reaches a terminal status.
async fn watch_progress(
    store: &Arc<Store>,
    batch_id: &str,
) -> anyhow::Result<crate::models::Batch> {
    let batch = store.get_batch(batch_id)?;
    let bar = ProgressBar::new(batch.total_docs.max(0) as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/dim}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    loop {
        let current = store.get_batch(batch_id)?;
        bar.set_position(current.processed_docs.max(0) as u64);
        match current.status {
            BatchStatus::Completed => {
                bar.finish_with_message("done");
                return Ok(current);
            }
            BatchStatus::Error => {
                bar.abandon_with_message("failed");
                anyhow::bail!("batch ended in error");
            }
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

fn list_batches(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let batches = store.list_batches()?;
    if batches.is_empty() {
        println!("No batches yet. Run `redact-qc scan <folder>` to create one.");
        return Ok(());
    }

    for batch in batches {
        println!(
            "{}  {:<12} {:>4}/{:<4} docs, {} with findings  {}",
            style(&batch.id[..8]).cyan(),
            batch.status.as_str(),
            batch.processed_docs,
            batch.total_docs,
            batch.docs_with_findings,
            batch.name,
        );
    }
    Ok(())
}

async fn report(settings: &Settings, batch_id: &str, format: &str) -> anyhow::Result<()> {
    let format = match format.to_lowercase().as_str() {
        "csv" => ReportFormat::Csv,
        "pdf" => ReportFormat::Pdf,
        other => anyhow::bail!("unsupported report format: {other} (use csv or pdf)"),
    };

    let store = open_store(settings)?;
    let reports = crate::reports::ReportManager::new(store, settings.reports_dir());
    let meta = reports.generate(batch_id, format).await?;

    let bar = ProgressBar::new_spinner();
    bar.set_message("generating report");
    loop {
        bar.tick();
        match reports.get(&meta.id) {
            Some(current) if current.status == ReportStatus::Completed => {
                bar.finish_and_clear();
                println!(
                    "{} {}",
                    style("Report written:").green().bold(),
                    settings
                        .reports_dir()
                        .join(current.filename.unwrap_or_default())
                        .display()
                );
                return Ok(());
            }
            Some(current) if current.status == ReportStatus::Failed => {
                bar.finish_and_clear();
                anyhow::bail!(
                    "report generation failed: {}",
                    current.error.unwrap_or_else(|| "unknown".into())
                );
            }
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}
