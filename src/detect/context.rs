//! Token-window context scoring.
//!
//! A finding's confidence is adjusted by the words around it: a word
//! characteristic of the PII type boosts the score, a negating word
//! ("example", "sample", "redacted") halves it. Boost applies before
//! penalty, and the result is capped at 1.0.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Tokens searched on each side of a span.
pub const CONTEXT_WINDOW: usize = 6;

/// Multiplier applied when a type-characteristic word is in the window.
pub const CTX_BOOST: f64 = 0.35;

/// Multiplier applied when a negating word is in the window.
pub const CTX_PENALTY: f64 = 0.5;

static NEGATION_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["example", "sample", "redacted", "fictitious", "dummy", "placeholder", "test"]
        .into_iter()
        .collect()
});

/// Role words that promote a `PERSON` to `LEGAL_ROLE_NAME`.
pub static LEGAL_ROLE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "judge",
        "justice",
        "attorney",
        "counsel",
        "lawyer",
        "defendant",
        "plaintiff",
        "victim",
        "witness",
        "minor",
        "juvenile",
        "suspect",
        "respondent",
        "petitioner",
        "complainant",
        "informant",
        "officer",
        "detective",
        "agent",
    ]
    .into_iter()
    .collect()
});

/// Words that strengthen confidence in a type when seen near a match.
pub fn context_words(pii_type: &str) -> &'static [&'static str] {
    match pii_type {
        "US_SSN" => &["ssn", "social", "security"],
        "US_ITIN" => &["itin", "taxpayer"],
        "CREDIT_CARD" => &["card", "credit", "debit", "visa", "mastercard", "amex"],
        "US_BANK_NUMBER" | "BANK_ACCOUNT" => {
            &["account", "acct", "bank", "checking", "savings", "deposit"]
        }
        "ROUTING_NUMBER" => &["routing", "aba", "transit", "wire", "ach", "bank"],
        "US_PASSPORT" => &["passport"],
        "US_DRIVER_LICENSE" => &["license", "licence", "dl", "driver"],
        "PHONE_NUMBER" => &["phone", "tel", "telephone", "call", "fax", "cell", "mobile"],
        "EMAIL_ADDRESS" => &["email", "e-mail", "mail"],
        "IP_ADDRESS" => &["ip", "ipv4", "ipv6", "host", "server"],
        "URL" => &["url", "website", "site", "link"],
        "DATE_TIME" => &["date", "dated", "born", "dob", "time"],
        "MAC_ADDRESS" => &["mac", "ethernet", "wifi", "interface", "adapter"],
        "DEVICE_ID" => &["imei", "serial", "device", "meid", "esn"],
        "CASE_NUMBER" => &["case", "docket", "cause", "matter"],
        "MEDICAL_RECORD" => &["mrn", "medical", "patient", "record", "health"],
        "PERSON" => &["mr", "mrs", "ms", "dr"],
        "LOCATION" => &["address", "street", "residence", "located", "residing"],
        "LEGAL_ROLE_NAME" => &[
            "judge",
            "justice",
            "attorney",
            "counsel",
            "lawyer",
            "defendant",
            "plaintiff",
            "victim",
            "witness",
            "minor",
            "juvenile",
            "respondent",
            "petitioner",
        ],
        _ => &[],
    }
}

/// Whitespace tokens of a page, with byte offsets, for window lookups.
pub struct TokenIndex<'a> {
    /// (start, end, token) triples in text order.
    tokens: Vec<(usize, usize, &'a str)>,
}

impl<'a> TokenIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in text.char_indices() {
            if c.is_whitespace() {
                if let Some(s) = start.take() {
                    tokens.push((s, i, &text[s..i]));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push((s, text.len(), &text[s..]));
        }
        Self { tokens }
    }

    /// Indices of the tokens overlapping the byte span `[start, end)`.
    fn token_range(&self, start: usize, end: usize) -> (usize, usize) {
        let first = self.tokens.partition_point(|&(_, tok_end, _)| tok_end <= start);
        let mut last = first;
        while last < self.tokens.len() && self.tokens[last].0 < end {
            last += 1;
        }
        (first, last.max(first + 1).min(self.tokens.len().max(1)))
    }

    /// True if any token within `window` tokens of the span equals one
    /// of `words` (case-insensitive, punctuation-trimmed). Tokens
    /// inside the span itself are not considered.
    pub fn has_word_near(&self, start: usize, end: usize, window: usize, words: &[&str]) -> bool {
        self.scan_near(start, end, window, |tok| {
            words.iter().any(|w| w.eq_ignore_ascii_case(tok))
        })
    }

    /// Like [`Self::has_word_near`] for a set.
    pub fn has_word_in_set_near(
        &self,
        start: usize,
        end: usize,
        window: usize,
        words: &HashSet<&'static str>,
    ) -> bool {
        self.scan_near(start, end, window, |tok| {
            words.contains(tok.to_ascii_lowercase().as_str())
        })
    }

    fn scan_near(
        &self,
        start: usize,
        end: usize,
        window: usize,
        matches: impl Fn(&str) -> bool,
    ) -> bool {
        if self.tokens.is_empty() {
            return false;
        }
        let (first, last) = self.token_range(start, end);
        let lo = first.saturating_sub(window);
        let hi = (last + window).min(self.tokens.len());
        for (i, &(tok_start, tok_end, tok)) in self.tokens[lo..hi].iter().enumerate() {
            let idx = lo + i;
            // Skip tokens that overlap the span itself.
            if idx >= first && idx < last && tok_end > start && tok_start < end {
                continue;
            }
            let trimmed = tok.trim_matches(|c: char| !c.is_alphanumeric());
            if !trimmed.is_empty() && matches(trimmed) {
                return true;
            }
        }
        false
    }
}

/// Apply context multipliers to a base confidence: boost first, then
/// penalty, capped at 1.0.
pub fn adjust_confidence(
    base: f64,
    pii_type: &str,
    index: &TokenIndex<'_>,
    start: usize,
    end: usize,
) -> f64 {
    let mut score = base;

    if index.has_word_near(start, end, CONTEXT_WINDOW, context_words(pii_type)) {
        score = (score * (1.0 + CTX_BOOST)).min(1.0);
    }

    if index.has_word_in_set_near(start, end, CONTEXT_WINDOW, &NEGATION_WORDS) {
        score *= 1.0 - CTX_PENALTY;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_applies_when_keyword_in_window() {
        let text = "SSN 123-45-6789";
        let index = TokenIndex::new(text);
        let score = adjust_confidence(0.85, "US_SSN", &index, 4, 15);
        assert!((score - 1.0).abs() < 1e-9); // 0.85 * 1.35 capped
    }

    #[test]
    fn no_boost_without_keyword() {
        let text = "the number 123-45-6789 appears";
        let index = TokenIndex::new(text);
        let score = adjust_confidence(0.85, "US_SSN", &index, 11, 22);
        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn penalty_halves_score() {
        let text = "example SSN 123-45-6789";
        let index = TokenIndex::new(text);
        // Boost from "SSN" lands first (capped at 1.0), then the
        // "example" penalty halves it.
        let score = adjust_confidence(0.85, "US_SSN", &index, 12, 23);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn window_is_bounded() {
        let filler = "word ".repeat(CONTEXT_WINDOW + 2);
        let text = format!("ssn {filler}123-45-6789");
        let index = TokenIndex::new(&text);
        let start = text.find("123").unwrap();
        let score = adjust_confidence(0.85, "US_SSN", &index, start, start + 11);
        assert!((score - 0.85).abs() < 1e-9, "keyword beyond window must not boost");
    }

    #[test]
    fn span_tokens_are_not_their_own_context() {
        // The span itself contains "example" as part of the email
        // domain; only surrounding tokens count.
        let text = "write to john@example.com today";
        let index = TokenIndex::new(text);
        let start = text.find("john@").unwrap();
        let score = adjust_confidence(0.9, "EMAIL_ADDRESS", &index, start, start + 16);
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn punctuation_is_trimmed_from_tokens() {
        let text = "Witness: Julie Terry";
        let index = TokenIndex::new(text);
        assert!(index.has_word_in_set_near(9, 20, CONTEXT_WINDOW, &LEGAL_ROLE_WORDS));
    }

    #[test]
    fn token_index_handles_empty_text() {
        let index = TokenIndex::new("");
        assert!(!index.has_word_near(0, 0, 6, &["ssn"]));
    }
}
