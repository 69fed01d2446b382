//! Date and time expressions.

use std::sync::LazyLock;

use regex::Regex;

use super::{Recognizer, SpanMatch};

/// Common US date shapes plus clock times with an am/pm marker. Scores
/// modestly; dates are only sensitive in aggregate.
pub struct DateTimeRecognizer;

static DATE_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        // 3/14/2024, 03-14-24
        (
            Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b").unwrap(),
            0.6,
        ),
        // 2024-03-14
        (Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap(), 0.6),
        // March 14, 2024 / Mar 14 2024
        (
            Regex::new(
                r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)\.?\s+\d{1,2},?\s+\d{4}\b",
            )
            .unwrap(),
            0.7,
        ),
        // 4:30 pm
        (
            Regex::new(r"\b\d{1,2}:\d{2}\s*(?:[AaPp])\.?[Mm]\.?\b").unwrap(),
            0.6,
        ),
    ]
});

impl Recognizer for DateTimeRecognizer {
    fn name(&self) -> &'static str {
        "date_time"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches: Vec<SpanMatch> = Vec::new();
        for (pattern, confidence) in DATE_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                if matches
                    .iter()
                    .any(|existing| existing.start == m.start() && existing.end == m.end())
                {
                    continue;
                }
                matches.push(SpanMatch::new("DATE_TIME", m.start(), m.end(), *confidence));
            }
        }
        matches
    }
}
