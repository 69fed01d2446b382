//! PII detection over page text.
//!
//! The detector runs a fixed registry of structural recognizers plus
//! the entity engine, adjusts confidences by surrounding context,
//! drops candidates under the caller's threshold, reconciles
//! overlapping spans, and attaches a bounded context snippet to each
//! survivor. It never fails a page: a recognizer that panics is logged
//! (name only, never content) and skipped.

mod context;
mod ner;
pub mod recognizers;

pub use context::{CONTEXT_WINDOW, CTX_BOOST, CTX_PENALTY};
pub use recognizers::{Recognizer, SpanMatch};

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::models::severity_for;

use context::{adjust_confidence, TokenIndex, LEGAL_ROLE_WORDS};
use ner::{extract_entities, EntityKind};

/// Target snippet size in bytes.
pub const CONTEXT_MAX: usize = 80;

/// Snippets never exceed this many bytes.
pub const SNIPPET_HARD_CAP: usize = 256;

/// Minimum context bytes kept on each side of a match.
const MIN_SNIPPET_WINDOW: usize = 8;

/// Default confidence floor when the caller does not supply one.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.4;

/// A reconciled finding on a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub pii_type: String,
    pub confidence: f64,
    /// Byte offset into the page text as extracted.
    pub char_offset: usize,
    pub char_length: usize,
    pub context_snippet: String,
}

#[derive(Debug, Clone)]
struct Candidate {
    pii_type: &'static str,
    start: usize,
    end: usize,
    confidence: f64,
}

/// PII detector with a fixed recognizer registry. Immutable once
/// built; each worker constructs its own.
pub struct Detector {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    pub fn new() -> Self {
        Self {
            recognizers: recognizers::registry(),
        }
    }

    /// Detect PII in one page of text. Findings below `min_confidence`
    /// are dropped. Output is ordered by offset, then type.
    pub fn analyze(&self, text: &str, min_confidence: f64) -> Vec<Detection> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let index = TokenIndex::new(text);
        let mut candidates = self.collect_candidates(text, &index);

        for candidate in &mut candidates {
            candidate.confidence = adjust_confidence(
                candidate.confidence,
                candidate.pii_type,
                &index,
                candidate.start,
                candidate.end,
            );
        }

        candidates.retain(|c| c.confidence >= min_confidence);

        dedupe_identical(&mut candidates);
        resolve_overlaps(&mut candidates);

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.end.cmp(&b.end))
                .then(a.pii_type.cmp(b.pii_type))
        });

        candidates
            .into_iter()
            .map(|c| Detection {
                pii_type: c.pii_type.to_string(),
                confidence: c.confidence,
                char_offset: c.start,
                char_length: c.end - c.start,
                context_snippet: build_snippet(text, c.start, c.end - c.start),
            })
            .collect()
    }

    fn collect_candidates(&self, text: &str, index: &TokenIndex<'_>) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for recognizer in &self.recognizers {
            let result = catch_unwind(AssertUnwindSafe(|| recognizer.analyze(text)));
            match result {
                Ok(matches) => {
                    for m in matches {
                        if m.start < m.end && m.end <= text.len() {
                            candidates.push(Candidate {
                                pii_type: m.pii_type,
                                start: m.start,
                                end: m.end,
                                confidence: m.confidence,
                            });
                        }
                    }
                }
                Err(_) => {
                    warn!("recognizer '{}' panicked, skipping", recognizer.name());
                }
            }
        }

        for entity in extract_entities(text) {
            match entity.kind {
                EntityKind::Person => {
                    // A person near a legal role word becomes a role
                    // finding instead; the underlying person span is
                    // suppressed.
                    if index.has_word_in_set_near(
                        entity.start,
                        entity.end,
                        CONTEXT_WINDOW,
                        &LEGAL_ROLE_WORDS,
                    ) {
                        candidates.push(Candidate {
                            pii_type: "LEGAL_ROLE_NAME",
                            start: entity.start,
                            end: entity.end,
                            confidence: entity.confidence.max(0.85),
                        });
                    } else {
                        candidates.push(Candidate {
                            pii_type: "PERSON",
                            start: entity.start,
                            end: entity.end,
                            confidence: entity.confidence,
                        });
                    }
                }
                EntityKind::Location => candidates.push(Candidate {
                    pii_type: "LOCATION",
                    start: entity.start,
                    end: entity.end,
                    confidence: entity.confidence,
                }),
            }
        }

        candidates
    }
}

/// Collapse exact duplicates of `(pii_type, span)`, keeping the
/// highest confidence; persisted findings are unique on that key.
fn dedupe_identical(candidates: &mut Vec<Candidate>) {
    candidates.sort_by(|a, b| {
        a.pii_type
            .cmp(b.pii_type)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
            .then(b.confidence.total_cmp(&a.confidence))
    });
    candidates.dedup_by(|next, kept| {
        kept.pii_type == next.pii_type && kept.start == next.start && kept.end == next.end
    });
}

/// For fully overlapping spans of different types, keep the higher
/// severity; ties break on confidence, then on type name order.
/// Partial overlaps are left alone.
fn resolve_overlaps(candidates: &mut Vec<Candidate>) {
    let mut removed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if removed[i] || removed[j] {
                continue;
            }
            let (a, b) = (&candidates[i], &candidates[j]);
            if a.pii_type == b.pii_type || !fully_overlapping(a, b) {
                continue;
            }
            let loser = if wins(a, b) { j } else { i };
            removed[loser] = true;
        }
    }

    let mut keep = removed.iter().map(|r| !r);
    candidates.retain(|_| keep.next().unwrap());
}

fn fully_overlapping(a: &Candidate, b: &Candidate) -> bool {
    (a.start <= b.start && a.end >= b.end) || (b.start <= a.start && b.end >= a.end)
}

fn wins(a: &Candidate, b: &Candidate) -> bool {
    let (sev_a, sev_b) = (severity_for(a.pii_type), severity_for(b.pii_type));
    if sev_a != sev_b {
        return sev_a > sev_b;
    }
    if a.confidence != b.confidence {
        return a.confidence > b.confidence;
    }
    a.pii_type <= b.pii_type
}

/// Build the bounded snippet around a match: window on each side,
/// whitespace runs collapsed to single spaces, hard cap applied on a
/// character boundary.
fn build_snippet(text: &str, offset: usize, length: usize) -> String {
    let window = CONTEXT_MAX
        .saturating_sub(length)
        .div_euclid(2)
        .max(MIN_SNIPPET_WINDOW);

    let start = floor_char_boundary(text, offset.saturating_sub(window));
    let end = floor_char_boundary(text, (offset + length + window).min(text.len()));

    let collapsed: String = text[start..end].split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.len() <= SNIPPET_HARD_CAP {
        collapsed
    } else {
        let cut = floor_char_boundary(&collapsed, SNIPPET_HARD_CAP);
        collapsed[..cut].to_string()
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
