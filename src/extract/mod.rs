//! Per-page text extraction.
//!
//! Each page is tried against the PDF's native text layer first
//! (`pdftotext`); pages whose layer is missing or too sparse fall back
//! to OCR (`pdftoppm` raster + Tesseract). One bad page never prevents
//! extraction of the others: it degrades to empty text so page
//! numbering stays aligned.
//!
//! Extracted text is transient. Nothing in this module writes page
//! content to durable storage, and log lines only ever carry lengths.

mod ocr;

pub use ocr::OcrFailure;

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

use ocr::OcrEngine;

/// Errors that fail a whole document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open PDF: {detail}")]
    Unreadable { detail: String },
}

/// How a page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMethod {
    Native,
    Ocr,
}

/// Extracted text for a single page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
    pub method: ExtractMethod,
    /// 1.0 for native text; mean word confidence for OCR; 0.0 for a
    /// page that produced nothing.
    pub confidence: f64,
}

/// Source of page text for the pipeline. Implemented by [`Extractor`];
/// tests substitute canned pages.
pub trait PageSource: Send + Sync {
    /// Number of pages, or [`ExtractError::Unreadable`] if the file is
    /// not a readable PDF.
    fn page_count(&self, path: &Path) -> Result<u32, ExtractError>;

    /// Text for one page. Never fails; a page that cannot be extracted
    /// comes back empty.
    fn extract_page(&self, path: &Path, page: u32) -> PageText;
}

/// Poppler/Tesseract-backed extractor.
pub struct Extractor {
    native_min_chars: usize,
    ocr: OcrEngine,
}

impl Extractor {
    pub fn new(settings: &Settings) -> Self {
        Self {
            native_min_chars: settings.native_min_chars,
            ocr: OcrEngine::new(
                settings.ocr_dpi,
                settings.ocr_language.clone(),
                settings.ocr_timeout_secs,
                settings.tesseract_cmd.clone(),
            ),
        }
    }

    /// Run `pdftotext` restricted to a single page.
    fn native_page_text(&self, path: &Path, page: u32) -> Option<String> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(path)
            .arg("-")
            .output();

        match output {
            Ok(out) if out.status.success() => {
                Some(String::from_utf8_lossy(&out.stdout).into_owned())
            }
            Ok(out) => {
                debug!(
                    page,
                    "pdftotext exited nonzero: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                None
            }
            Err(e) => {
                debug!(page, "pdftotext unavailable: {}", e);
                None
            }
        }
    }
}

impl PageSource for Extractor {
    fn page_count(&self, path: &Path) -> Result<u32, ExtractError> {
        let output = Command::new("pdfinfo")
            .arg(path)
            .output()
            .map_err(|e| ExtractError::Unreadable {
                detail: format!("pdfinfo failed to run: {e} (install poppler-utils)"),
            })?;

        if !output.status.success() {
            return Err(ExtractError::Unreadable {
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout).ok_or_else(|| ExtractError::Unreadable {
            detail: "pdfinfo reported no page count".to_string(),
        })
    }

    fn extract_page(&self, path: &Path, page: u32) -> PageText {
        let native = self.native_page_text(path, page).unwrap_or_default();

        if !needs_ocr(&native, self.native_min_chars) {
            return PageText {
                page_number: page,
                text: native,
                method: ExtractMethod::Native,
                confidence: 1.0,
            };
        }

        match self.ocr.ocr_page(path, page) {
            Ok((text, confidence)) => PageText {
                page_number: page,
                text,
                method: ExtractMethod::Ocr,
                confidence,
            },
            Err(e) => {
                debug!(page, native_len = native.len(), "OCR fallback failed: {}", e);
                degraded_page(page, native, &e)
            }
        }
    }
}

/// Page text when the OCR fallback could not deliver. A page that
/// blew its OCR budget degrades to empty text at zero confidence; for
/// the other failures a sparse-but-real native layer is kept at half
/// confidence, and an empty one degrades the same way.
fn degraded_page(page: u32, native_text: String, failure: &OcrFailure) -> PageText {
    let timed_out = matches!(failure, OcrFailure::TimedOut(_));
    if timed_out || native_text.trim().is_empty() {
        PageText {
            page_number: page,
            text: String::new(),
            method: ExtractMethod::Native,
            confidence: 0.0,
        }
    } else {
        PageText {
            page_number: page,
            text: native_text,
            method: ExtractMethod::Native,
            confidence: 0.5,
        }
    }
}

/// True when the native layer is too sparse to trust and the page
/// should be OCRed. Whitespace does not count toward the threshold.
fn needs_ocr(native_text: &str, min_chars: usize) -> bool {
    let stripped = native_text.chars().filter(|c| !c.is_whitespace()).count();
    stripped < min_chars
}

fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}
