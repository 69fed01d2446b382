//! Legal case and docket numbers.

use std::sync::LazyLock;

use regex::Regex;

use super::{Recognizer, SpanMatch};

/// Case, docket and cause numbers in the formats common to US court
/// filings: `24-CV-12345`, `Case No. 12-345678`, `Docket No. 2024-12345`.
pub struct CaseNumberRecognizer;

static CASE_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"\b\d{2,4}-(?:CV|CR|CIV|CRIM|MC|MJ|JV|DR|PR|AP|BK)-\d{4,8}\b").unwrap(),
            0.85,
        ),
        (
            Regex::new(r"(?i)\bCase\s+No\.?\s*:?\s*\d{2,4}[-\s]?\d{3,8}\b").unwrap(),
            0.9,
        ),
        (
            Regex::new(r"(?i)\bDocket\s+(?:No\.?\s*)?:?\s*\d{2,4}[-\s]?\d{3,8}\b").unwrap(),
            0.9,
        ),
        (
            Regex::new(r"(?i)\bCause\s+No\.?\s*:?\s*\d{2,4}[-\s]?\d{3,8}\b").unwrap(),
            0.85,
        ),
    ]
});

impl Recognizer for CaseNumberRecognizer {
    fn name(&self) -> &'static str {
        "case_number"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();
        for (pattern, confidence) in CASE_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                matches.push(SpanMatch::new("CASE_NUMBER", m.start(), m.end(), *confidence));
            }
        }
        matches
    }
}
