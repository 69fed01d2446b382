//! Shared fixtures for end-to-end scan tests: a canned page source
//! keyed by filename, and a fully wired manager over a temp store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use redact_qc::batch::BatchManager;
use redact_qc::config::Settings;
use redact_qc::extract::{ExtractError, ExtractMethod, PageSource, PageText};
use redact_qc::models::{Batch, BatchStatus};
use redact_qc::repository::Store;
use redact_qc::worker::EngineFactory;

/// A page of fixture text plus how it was "extracted".
#[derive(Clone)]
pub struct FixturePage {
    pub text: String,
    pub method: ExtractMethod,
    pub confidence: f64,
}

impl FixturePage {
    pub fn native(text: &str) -> Self {
        Self {
            text: text.to_string(),
            method: ExtractMethod::Native,
            confidence: 1.0,
        }
    }

    pub fn ocr(text: &str, confidence: f64) -> Self {
        Self {
            text: text.to_string(),
            method: ExtractMethod::Ocr,
            confidence,
        }
    }
}

/// Serves canned pages for any path whose filename is known.
pub struct FixtureSource {
    pages: HashMap<String, Vec<FixturePage>>,
}

impl PageSource for FixtureSource {
    fn page_count(&self, path: &Path) -> Result<u32, ExtractError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.pages
            .get(&name)
            .map(|p| p.len() as u32)
            .ok_or_else(|| ExtractError::Unreadable {
                detail: format!("no fixture for {name}"),
            })
    }

    fn extract_page(&self, path: &Path, page: u32) -> PageText {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let fixture = &self.pages[&name][(page - 1) as usize];
        PageText {
            page_number: page,
            text: fixture.text.clone(),
            method: fixture.method,
            confidence: fixture.confidence,
        }
    }
}

pub fn fixture_factory(pages: HashMap<String, Vec<FixturePage>>) -> EngineFactory {
    Arc::new(move || {
        Box::new(FixtureSource {
            pages: pages.clone(),
        }) as Box<dyn PageSource>
    })
}

/// A temp data dir with a store, a manager over canned pages, and a
/// source folder containing stub files for the given names.
pub struct Harness {
    pub store: Arc<Store>,
    pub manager: BatchManager,
    pub settings: Settings,
    pub source_dir: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

pub fn harness(pages: HashMap<String, Vec<FixturePage>>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::with_data_dir(dir.path().join("data"));
    settings.ensure_dirs().unwrap();

    let store = Arc::new(Store::open(&settings.database_path()).unwrap());

    let source_dir = dir.path().join("source");
    std::fs::create_dir(&source_dir).unwrap();
    for name in pages.keys() {
        std::fs::write(source_dir.join(name), b"%PDF-1.5 stub").unwrap();
    }

    let manager = BatchManager::with_engine_factory(
        Arc::clone(&store),
        settings.clone(),
        fixture_factory(pages),
    );

    Harness {
        store,
        manager,
        settings,
        source_dir,
        _dir: dir,
    }
}

pub async fn wait_until_completed(store: &Store, batch_id: &str) -> Batch {
    for _ in 0..1000 {
        let batch = store.get_batch(batch_id).unwrap();
        if batch.status == BatchStatus::Completed {
            return batch;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("batch {batch_id} never completed");
}
