//! Medical record numbers and patient identifiers.

use std::sync::LazyLock;

use regex::Regex;

use super::{Recognizer, SpanMatch};

/// Record numbers anchored to MRN / medical-record / patient keywords.
pub struct MedicalRecordRecognizer;

static MRN_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bMRN[\s#:.]*(\d{5,12})\b").unwrap(),
            0.9,
        ),
        (
            Regex::new(r"(?i)\bmedical\s+record[\s#:.]*(?:number|no\.?)?[\s#:.]*(\d{5,12})\b")
                .unwrap(),
            0.85,
        ),
        (
            Regex::new(r"(?i)\bpatient\s+(?:id|identifier|number|no\.?)[\s#:.]*(\d{5,12})\b")
                .unwrap(),
            0.85,
        ),
        (
            Regex::new(r"(?i)\bhealth\s+record[\s#:.]*(?:number|no\.?)?[\s#:.]*(\d{5,12})\b")
                .unwrap(),
            0.8,
        ),
    ]
});

impl Recognizer for MedicalRecordRecognizer {
    fn name(&self) -> &'static str {
        "medical_record"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();
        for (pattern, confidence) in MRN_PATTERNS.iter() {
            for cap in pattern.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    if matches
                        .iter()
                        .any(|existing: &SpanMatch| existing.start == m.start())
                    {
                        continue;
                    }
                    matches.push(SpanMatch::new(
                        "MEDICAL_RECORD",
                        m.start(),
                        m.end(),
                        *confidence,
                    ));
                }
            }
        }
        matches
    }
}
