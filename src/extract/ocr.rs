//! OCR fallback: rasterise one page with `pdftoppm`, read it with
//! Tesseract in TSV mode to get per-word confidences.
//!
//! Scratch images live in a [`ScrubbedTempDir`] so raster bytes are
//! zeroed before the directory is removed, on every exit path.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::security::ScrubbedTempDir;

#[derive(Debug, Error)]
pub enum OcrFailure {
    #[error("tool not found: {0} (install poppler-utils / tesseract-ocr)")]
    ToolNotFound(&'static str),

    #[error("ocr failed: {0}")]
    Failed(String),

    #[error("ocr exceeded {0:?} budget")]
    TimedOut(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) struct OcrEngine {
    dpi: u32,
    language: String,
    page_budget: Duration,
    tesseract_cmd: String,
}

impl OcrEngine {
    pub fn new(
        dpi: u32,
        language: String,
        timeout_secs: u64,
        tesseract_cmd: Option<String>,
    ) -> Self {
        Self {
            dpi,
            language,
            page_budget: Duration::from_secs(timeout_secs),
            tesseract_cmd: tesseract_cmd.unwrap_or_else(|| "tesseract".to_string()),
        }
    }

    /// OCR a single page. Returns the recognised text and the mean
    /// word confidence in `[0, 1]`.
    pub fn ocr_page(&self, pdf_path: &Path, page: u32) -> Result<(String, f64), OcrFailure> {
        let scratch = ScrubbedTempDir::new()?;
        let image = self.rasterise_page(pdf_path, page, scratch.path())?;
        let tsv = self.run_tesseract_tsv(&image)?;
        Ok(parse_tsv(&tsv))
    }

    fn rasterise_page(
        &self,
        pdf_path: &Path,
        page: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, OcrFailure> {
        let page_str = page.to_string();
        let prefix = out_dir.join("page");

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string(), "-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(&prefix)
            .status();

        match status {
            Ok(s) if s.success() => find_page_image(out_dir, page)
                .ok_or_else(|| OcrFailure::Failed(format!("no image generated for page {page}"))),
            Ok(_) => Err(OcrFailure::Failed(
                "pdftoppm failed to rasterise page".to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrFailure::ToolNotFound("pdftoppm"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run Tesseract with TSV output, killing it if it exceeds the
    /// per-page budget.
    fn run_tesseract_tsv(&self, image: &Path) -> Result<String, OcrFailure> {
        let mut child = Command::new(&self.tesseract_cmd)
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.language, "tsv"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrFailure::ToolNotFound("tesseract")
                } else {
                    OcrFailure::Io(e)
                }
            })?;

        // Drain stdout on a separate thread so a chatty page cannot
        // fill the pipe while we poll for completion.
        let mut stdout = child.stdout.take().expect("stdout piped");
        let reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + self.page_budget;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    debug!("tesseract over budget, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err(OcrFailure::TimedOut(self.page_budget));
                }
                None => std::thread::sleep(Duration::from_millis(50)),
            }
        };

        let output = reader.join().unwrap_or_default();
        if !status.success() {
            return Err(OcrFailure::Failed(format!(
                "tesseract exited with {status}"
            )));
        }
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

/// Locate the raster `pdftoppm` wrote. The page-number suffix padding
/// varies with the document's total page count.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page, width = digits);
        let path = dir.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Reassemble text and mean word confidence from Tesseract TSV output.
///
/// Word rows are level 5; their `conf` column is `-1` for non-text
/// boxes, which are skipped. Confidence is averaged over real words
/// and scaled from percent to `[0, 1]`.
fn parse_tsv(tsv: &str) -> (String, f64) {
    let mut text = String::new();
    let mut confidences: Vec<f64> = Vec::new();
    let mut current_line: Option<(&str, &str, &str, &str)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let conf: f64 = match cols[10].parse() {
            Ok(c) if c >= 0.0 => c,
            _ => continue,
        };
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }

        // page/block/paragraph/line identify the line a word sits on.
        let line_key = (cols[1], cols[2], cols[3], cols[4]);
        match current_line {
            Some(prev) if prev == line_key => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(line_key);

        text.push_str(word);
        confidences.push(conf);
    }

    let mean = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64 / 100.0
    };

    (text, mean)
}
