//! Financial identifiers: payment cards, ABA routing numbers, bank
//! accounts.

use std::sync::LazyLock;

use regex::Regex;

use super::{aba_valid, luhn_valid, Recognizer, SpanMatch};

/// Payment card numbers: 13-19 digits, optionally grouped by spaces or
/// dashes, validated with the Luhn check. A failed check drops the
/// candidate entirely rather than lowering its score.
pub struct CreditCardRecognizer;

static CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}(?:[ -]?\d{4}){2}(?:[ -]?\d{1,7})?\b").unwrap());

impl Recognizer for CreditCardRecognizer {
    fn name(&self) -> &'static str {
        "credit_card"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        CARD.find_iter(text)
            .filter(|m| {
                let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
                (13..=19).contains(&digits.len()) && luhn_valid(&digits)
            })
            .map(|m| SpanMatch::new("CREDIT_CARD", m.start(), m.end(), 0.85))
            .collect()
    }
}

/// ABA routing numbers: nine digits with a valid check digit. Finance
/// keywords nearby raise the base; a checksum-valid nine-digit run
/// without them still scores enough to survive the default filter.
pub struct RoutingNumberRecognizer;

static NINE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{9}\b").unwrap());

const ROUTING_KEYWORDS: &[&str] = &["routing", "aba", "transit", "bank", "wire", "ach"];

impl Recognizer for RoutingNumberRecognizer {
    fn name(&self) -> &'static str {
        "routing_number"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        NINE_DIGITS
            .find_iter(text)
            .filter(|m| aba_valid(m.as_str()))
            .map(|m| {
                let window_start = m.start().saturating_sub(80);
                let window_end = (m.end() + 80).min(text.len());
                let window = safe_slice(text, window_start, window_end).to_lowercase();
                let confidence = if ROUTING_KEYWORDS.iter().any(|kw| window.contains(kw)) {
                    0.85
                } else {
                    0.5
                };
                SpanMatch::new("ROUTING_NUMBER", m.start(), m.end(), confidence)
            })
            .collect()
    }
}

/// Bank account numbers: 8-17 digits anchored to an account keyword.
pub struct BankAccountRecognizer;

static ACCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:account|acct)(?:\s+(?:number|no\.?))?[\s#:.]*(\d{8,17})\b").unwrap()
});

static BANK_ACCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:bank|checking|savings|deposit)\s+(?:account|acct)(?:\s+(?:number|no\.?))?[\s#:.]*(\d{8,17})\b",
    )
    .unwrap()
});

impl Recognizer for BankAccountRecognizer {
    fn name(&self) -> &'static str {
        "bank_account"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();

        for cap in BANK_ACCOUNT.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                matches.push(SpanMatch::new("US_BANK_NUMBER", m.start(), m.end(), 0.85));
            }
        }
        for cap in ACCOUNT.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                // Skip spans the bank-prefixed pattern already claimed.
                if matches
                    .iter()
                    .any(|existing: &SpanMatch| existing.start == m.start())
                {
                    continue;
                }
                matches.push(SpanMatch::new("BANK_ACCOUNT", m.start(), m.end(), 0.75));
            }
        }

        matches
    }
}

/// Slice text on char boundaries, widening inward as needed.
fn safe_slice(text: &str, mut start: usize, mut end: usize) -> &str {
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}
