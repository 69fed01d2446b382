//! Single-document processing: extract each page, detect PII, hand the
//! accumulated findings back to the caller.
//!
//! The pipeline holds no durable state and never touches the store;
//! persistence is the batch manager's job. Page text lives only inside
//! the per-page loop, so nothing but findings and counts survives the
//! call.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::detect::Detector;
use crate::extract::{ExtractError, PageSource};
use crate::models::FindingDraft;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The PDF could not be opened at all.
    #[error("extraction failed: {0}")]
    ExtractFail(String),

    /// Unexpected failure mid-document.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Outcome of processing one document.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        page_count: u32,
        findings: Vec<FindingDraft>,
    },
    /// Cancelled cooperatively between pages. The partial result is
    /// intentionally not exposed; callers must treat the document as
    /// unprocessed.
    Cancelled,
}

/// Process one document: page count, then per-page extract + detect.
///
/// The cancel flag is consulted between pages, so cancellation
/// converges within one page's processing time.
pub fn process_document(
    source: &dyn PageSource,
    detector: &Detector,
    filepath: &Path,
    confidence_threshold: f64,
    cancel: &AtomicBool,
) -> Result<PipelineOutcome, PipelineError> {
    if cancel.load(Ordering::Relaxed) {
        return Ok(PipelineOutcome::Cancelled);
    }

    let page_count = source
        .page_count(filepath)
        .map_err(|ExtractError::Unreadable { detail }| PipelineError::ExtractFail(detail))?;

    let mut findings = Vec::new();

    for page in 1..=page_count {
        let page_text = source.extract_page(filepath, page);
        debug_assert_eq!(page_text.page_number, page);

        if !page_text.text.trim().is_empty() {
            for detection in detector.analyze(&page_text.text, confidence_threshold) {
                findings.push(FindingDraft {
                    page_number: page,
                    pii_type: detection.pii_type,
                    confidence: detection.confidence,
                    char_offset: detection.char_offset,
                    char_length: detection.char_length,
                    context_snippet: detection.context_snippet,
                });
            }
        }

        if cancel.load(Ordering::Relaxed) {
            debug!(page, "cancelled mid-document");
            return Ok(PipelineOutcome::Cancelled);
        }
    }

    debug!(
        pages = page_count,
        findings = findings.len(),
        "document processed"
    );

    Ok(PipelineOutcome::Completed {
        page_count,
        findings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractMethod, PageText};
    use std::path::PathBuf;

    struct FixedPages {
        pages: Vec<String>,
    }

    impl PageSource for FixedPages {
        fn page_count(&self, _path: &Path) -> Result<u32, ExtractError> {
            Ok(self.pages.len() as u32)
        }

        fn extract_page(&self, _path: &Path, page: u32) -> PageText {
            PageText {
                page_number: page,
                text: self.pages[(page - 1) as usize].clone(),
                method: ExtractMethod::Native,
                confidence: 1.0,
            }
        }
    }

    struct BrokenPdf;

    impl PageSource for BrokenPdf {
        fn page_count(&self, _path: &Path) -> Result<u32, ExtractError> {
            Err(ExtractError::Unreadable {
                detail: "not a PDF".into(),
            })
        }

        fn extract_page(&self, _path: &Path, page: u32) -> PageText {
            PageText {
                page_number: page,
                text: String::new(),
                method: ExtractMethod::Native,
                confidence: 0.0,
            }
        }
    }

    fn not_cancelled() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn findings_accumulate_across_pages() {
        let source = FixedPages {
            pages: vec![
                "Contact John Smith at john@example.com or 555-123-4567.".into(),
                "SSN 123-45-6789".into(),
            ],
        };
        let detector = Detector::new();
        let outcome = process_document(
            &source,
            &detector,
            &PathBuf::from("doc.pdf"),
            0.4,
            &not_cancelled(),
        )
        .unwrap();

        let PipelineOutcome::Completed {
            page_count,
            findings,
        } = outcome
        else {
            panic!("expected completion");
        };
        assert_eq!(page_count, 2);
        assert!(findings.iter().any(|f| f.pii_type == "US_SSN" && f.page_number == 2));
        assert!(findings
            .iter()
            .any(|f| f.pii_type == "EMAIL_ADDRESS" && f.page_number == 1));
        // Page numbers are strictly ascending in output order.
        let pages: Vec<u32> = findings.iter().map(|f| f.page_number).collect();
        let mut sorted = pages.clone();
        sorted.sort_unstable();
        assert_eq!(pages, sorted);
    }

    #[test]
    fn zero_page_document_completes_empty() {
        let source = FixedPages { pages: vec![] };
        let detector = Detector::new();
        let outcome = process_document(
            &source,
            &detector,
            &PathBuf::from("empty.pdf"),
            0.4,
            &not_cancelled(),
        )
        .unwrap();
        let PipelineOutcome::Completed {
            page_count,
            findings,
        } = outcome
        else {
            panic!("expected completion");
        };
        assert_eq!(page_count, 0);
        assert!(findings.is_empty());
    }

    #[test]
    fn blank_pages_produce_no_findings_but_count() {
        let source = FixedPages {
            pages: vec!["".into(), "   ".into(), "SSN 123-45-6789".into()],
        };
        let detector = Detector::new();
        let outcome = process_document(
            &source,
            &detector,
            &PathBuf::from("doc.pdf"),
            0.4,
            &not_cancelled(),
        )
        .unwrap();
        let PipelineOutcome::Completed {
            page_count,
            findings,
        } = outcome
        else {
            panic!("expected completion");
        };
        assert_eq!(page_count, 3);
        assert!(findings.iter().all(|f| f.page_number == 3));
    }

    #[test]
    fn unreadable_pdf_is_extract_fail() {
        let detector = Detector::new();
        let err = process_document(
            &BrokenPdf,
            &detector,
            &PathBuf::from("bad.pdf"),
            0.4,
            &not_cancelled(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::ExtractFail(_)));
    }

    #[test]
    fn preset_cancel_returns_cancelled_without_work() {
        let source = FixedPages {
            pages: vec!["SSN 123-45-6789".into()],
        };
        let detector = Detector::new();
        let cancel = AtomicBool::new(true);
        let outcome = process_document(
            &source,
            &detector,
            &PathBuf::from("doc.pdf"),
            0.4,
            &cancel,
        )
        .unwrap();
        assert!(matches!(outcome, PipelineOutcome::Cancelled));
    }

    #[test]
    fn threshold_is_passed_through() {
        let source = FixedPages {
            pages: vec!["Contact John Smith at john@example.com or 555-123-4567.".into()],
        };
        let detector = Detector::new();
        let outcome = process_document(
            &source,
            &detector,
            &PathBuf::from("doc.pdf"),
            0.95,
            &not_cancelled(),
        )
        .unwrap();
        let PipelineOutcome::Completed { findings, .. } = outcome else {
            panic!("expected completion");
        };
        assert!(findings.is_empty());
    }
}
