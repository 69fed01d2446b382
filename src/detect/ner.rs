//! Named-entity extraction for person names and locations.
//!
//! Pattern-based, tuned for the formal register of court records and
//! affidavits. High precision beats recall here: a missed name costs a
//! reviewer a moment, a page of false positives costs the tool its
//! credibility.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Entity classes the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Location,
}

/// An entity span in page text (byte offsets).
#[derive(Debug, Clone)]
pub struct EntitySpan {
    pub kind: EntityKind,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

/// Two to four capitalized words, optionally with a middle initial.
static CANDIDATE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+(?:[A-Z]\.\s+)?[A-Z][a-z]+){1,3}\b")
        .expect("name pattern should compile")
});

/// Honorific-led names get a confidence bump.
static HONORIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Mr|Mrs|Ms|Dr|Hon)\.?\s*$").expect("honorific pattern should compile")
});

/// Street addresses: number + capitalized name(s) + street suffix.
static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\d{1,5}\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?\s+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Court|Ct|Place|Pl|Way)\b\.?",
    )
    .expect("street pattern should compile")
});

static US_STATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
        "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
        "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
        "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
        "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
        "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
        "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
        "Wisconsin", "Wyoming",
    ]
    .iter()
    .map(|s| Regex::new(&format!(r"\b{}\b", regex::escape(s))).unwrap())
    .collect()
});

/// Leading tokens that introduce a name but are not part of it.
static NON_NAME_LEADERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "contact", "dear", "witness", "judge", "justice", "attorney", "counsel", "defendant",
        "plaintiff", "petitioner", "respondent", "victim", "officer", "detective", "agent",
        "sergeant", "deputy", "the", "from", "to", "re", "subject", "state", "county", "city",
        "honorable", "regarding", "sincerely",
    ]
    .into_iter()
    .collect()
});

/// Multiword candidates that look like names but never are.
static NAME_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "United States",
        "New York",
        "New Jersey",
        "New Mexico",
        "New Hampshire",
        "North Carolina",
        "North Dakota",
        "South Carolina",
        "South Dakota",
        "West Virginia",
        "Rhode Island",
        "Supreme Court",
        "District Court",
        "Superior Court",
        "Circuit Court",
        "Police Department",
        "Social Security",
        "Due Process",
        "District Attorney",
        "Grand Jury",
        "Exhibit A",
    ]
    .into_iter()
    .collect()
});

/// Trailing words that mark a place, not a person.
static PLACE_SUFFIXES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "Street", "Avenue", "Road", "Boulevard", "Drive", "Lane", "Court", "Place", "Way",
        "County", "City", "Township", "Parish",
    ]
    .into_iter()
    .collect()
});

/// Extract person and location spans from page text.
pub fn extract_entities(text: &str) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    extract_persons(text, &mut spans);
    extract_locations(text, &mut spans);
    spans
}

fn extract_persons(text: &str, spans: &mut Vec<EntitySpan>) {
    for m in CANDIDATE_NAME.find_iter(text) {
        let Some((start, end)) = trim_candidate(text, m.start(), m.end()) else {
            continue;
        };
        let name = &text[start..end];
        if NAME_STOPWORDS.contains(name) || ends_in_place_suffix(name) {
            continue;
        }
        let confidence = if HONORIFIC.is_match(&text[..start]) {
            0.9
        } else {
            0.85
        };
        spans.push(EntitySpan {
            kind: EntityKind::Person,
            start,
            end,
            confidence,
        });
    }
}

fn extract_locations(text: &str, spans: &mut Vec<EntitySpan>) {
    for m in STREET_ADDRESS.find_iter(text) {
        spans.push(EntitySpan {
            kind: EntityKind::Location,
            start: m.start(),
            end: m.end(),
            confidence: 0.75,
        });
    }
    for state in US_STATES.iter() {
        for m in state.find_iter(text) {
            spans.push(EntitySpan {
                kind: EntityKind::Location,
                start: m.start(),
                end: m.end(),
                confidence: 0.7,
            });
        }
    }
}

/// Drop leading tokens like "Contact" or "Witness" that introduce a
/// name; returns `None` when fewer than two words remain.
fn trim_candidate(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let mut start = start;
    loop {
        let candidate = &text[start..end];
        let mut words = candidate.split_whitespace();
        let first = words.next()?;
        if words.next().is_none() {
            return None; // single word left, not a name
        }
        if NON_NAME_LEADERS.contains(first.to_ascii_lowercase().as_str()) {
            let first_len = first.len();
            let rest = &candidate[first_len..];
            let skipped = rest.len() - rest.trim_start().len();
            start += first_len + skipped;
        } else {
            return Some((start, end));
        }
    }
}

fn ends_in_place_suffix(name: &str) -> bool {
    name.split_whitespace()
        .last()
        .map(|w| PLACE_SUFFIXES.contains(w))
        .unwrap_or(false)
}
