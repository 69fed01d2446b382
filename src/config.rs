//! Application settings with platform-appropriate defaults.

use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

/// Subdirectory of the data directory where generated reports land.
const REPORTS_SUBDIR: &str = "reports";

/// Database filename inside the data directory.
const DATABASE_FILENAME: &str = "redactqc.db";

/// Runtime settings for scanning, detection and the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory for the database and generated reports.
    pub data_dir: PathBuf,

    /// Worker threads used per batch scan.
    pub worker_count: usize,
    /// Documents submitted to the pool per chunk.
    pub chunk_size: usize,

    /// Minimum confidence for a finding to be recorded.
    pub confidence_threshold: f64,

    /// Rasterisation resolution for the OCR fallback.
    pub ocr_dpi: u32,
    /// Tesseract language pack.
    pub ocr_language: String,
    /// Explicit Tesseract binary; found on PATH when unset.
    pub tesseract_cmd: Option<String>,
    /// Soft per-page OCR budget in seconds; an over-budget page is
    /// treated as empty rather than failing the document.
    pub ocr_timeout_secs: u64,
    /// Pages with fewer stripped characters than this in their text
    /// layer fall back to OCR.
    pub native_min_chars: usize,

    /// Port for the dashboard server (always bound to 127.0.0.1).
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            worker_count: default_worker_count(),
            chunk_size: 100,
            confidence_threshold: 0.4,
            ocr_dpi: 300,
            ocr_language: "eng".to_string(),
            tesseract_cmd: None,
            ocr_timeout_secs: 60,
            native_min_chars: 50,
            port: 8000,
        }
    }
}

impl Settings {
    /// Settings rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Self::default()
        }
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILENAME)
    }

    /// Directory for generated reports.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join(REPORTS_SUBDIR)
    }

    /// Create the data and reports directories if missing.
    ///
    /// On Unix the data directory is created with mode 0700 so findings
    /// are not readable by other local users.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        create_private_dir(&self.data_dir)?;
        create_private_dir(&self.reports_dir())?;
        Ok(())
    }
}

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(path)
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(path)
    }
}

/// Platform-conventional data directory: `%LOCALAPPDATA%\redact-qc` on
/// Windows, `$XDG_DATA_HOME/redact-qc` (default `~/.local/share`) elsewhere.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("redact-qc")
}

/// One worker per core, minus one for the coordinator, floor 1.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}
