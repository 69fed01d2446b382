//! Government-issued identifiers: SSN variants, ITIN, passport,
//! driver's license.

use std::sync::LazyLock;

use regex::Regex;

use super::{Recognizer, SpanMatch};

/// Social Security Numbers, including keyword-anchored and partial
/// ("last four") forms. Area 000/666/9xx and group/serial all-zero
/// values are never issued and are excluded outright.
pub struct SsnRecognizer;

static SSN_FULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static SSN_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:000|666|9\d\d)-|^\d{3}-00-|-0000$").unwrap());

static SSN_NO_DASHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:SSN|social\s+security)(?:\s+(?:number|no\.?))?[\s#:]*(\d{9})\b").unwrap()
});

static SSN_LAST4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:SSN|social\s+security)[\s:]*(?:ending\s+(?:in\s+)?|last\s+(?:four|4)\s*:?\s*)(\d{4})\b",
    )
    .unwrap()
});

impl Recognizer for SsnRecognizer {
    fn name(&self) -> &'static str {
        "ssn"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();

        for m in SSN_FULL.find_iter(text) {
            if SSN_INVALID.is_match(m.as_str()) {
                continue;
            }
            matches.push(SpanMatch::new("US_SSN", m.start(), m.end(), 0.85));
        }

        for cap in SSN_NO_DASHES.captures_iter(text) {
            if let Some(digits) = cap.get(1) {
                let d = digits.as_str();
                if d.starts_with("000") || d.starts_with("666") || d.starts_with('9') {
                    continue;
                }
                matches.push(SpanMatch::new("US_SSN", digits.start(), digits.end(), 0.8));
            }
        }

        for cap in SSN_LAST4.captures_iter(text) {
            if let Some(digits) = cap.get(1) {
                matches.push(SpanMatch::new("US_SSN", digits.start(), digits.end(), 0.7));
            }
        }

        matches
    }
}

/// Individual Taxpayer Identification Numbers: 9xx-7x..9x-xxxx with
/// the IRS-assigned group ranges.
pub struct ItinRecognizer;

static ITIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b9\d{2}-(?:5\d|6[0-5]|7\d|8[0-8]|9[0-2]|9[4-9])-\d{4}\b").unwrap()
});

impl Recognizer for ItinRecognizer {
    fn name(&self) -> &'static str {
        "itin"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        ITIN.find_iter(text)
            .map(|m| SpanMatch::new("US_ITIN", m.start(), m.end(), 0.8))
            .collect()
    }
}

/// US passport numbers: nine digits anchored to a passport keyword.
pub struct PassportRecognizer;

static PASSPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)passport(?:\s+(?:number|no\.?))?[\s#:]*(\d{9})\b").unwrap()
});

impl Recognizer for PassportRecognizer {
    fn name(&self) -> &'static str {
        "passport"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        PASSPORT
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| SpanMatch::new("US_PASSPORT", m.start(), m.end(), 0.85))
            .collect()
    }
}

/// Driver's license numbers for common state shapes, keyword-anchored.
pub struct DriversLicenseRecognizer;

static DL_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    vec![
        // Letter + digits shapes (CA, FL and many others)
        (
            Regex::new(r"(?i)(?:driver'?s?\s*licen[sc]e|\bDL\b|D\.L\.)[\s#:]*([A-Z]\d{6,14})\b")
                .unwrap(),
            0.8,
        ),
        // All-digit shapes (TX 8, NY 9)
        (
            Regex::new(r"(?i)(?:driver'?s?\s*licen[sc]e|\bDL\b|D\.L\.)[\s#:]*(\d{8,9})\b").unwrap(),
            0.7,
        ),
    ]
});

impl Recognizer for DriversLicenseRecognizer {
    fn name(&self) -> &'static str {
        "drivers_license"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();
        for (pattern, confidence) in DL_PATTERNS.iter() {
            for cap in pattern.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    matches.push(SpanMatch::new(
                        "US_DRIVER_LICENSE",
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

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(r: &dyn Recognizer, text: &str) -> Vec<(String, f64)> {
        r.analyze(text)
            .into_iter()
            .map(|m| (text[m.start..m.end].to_string(), m.confidence))
            .collect()
    }

    #[test]
    fn full_ssn_with_dashes() {
        let found = spans(&SsnRecognizer, "SSN 123-45-6789 on file");
        assert_eq!(found, vec![("123-45-6789".to_string(), 0.85)]);
    }

    #[test]
    fn never_issued_ssns_are_skipped() {
        assert!(spans(&SsnRecognizer, "id 000-12-3456").is_empty());
        assert!(spans(&SsnRecognizer, "id 666-12-3456").is_empty());
        assert!(spans(&SsnRecognizer, "id 900-12-3456").is_empty());
        assert!(spans(&SsnRecognizer, "id 123-00-4567").is_empty());
        assert!(spans(&SsnRecognizer, "id 123-45-0000").is_empty());
    }

    #[test]
    fn keyword_anchored_ssn_without_dashes() {
        let found = spans(&SsnRecognizer, "Social Security Number: 123456789");
        assert_eq!(found, vec![("123456789".to_string(), 0.8)]);
        // Bare nine digits without the keyword are not an SSN
        assert!(spans(&SsnRecognizer, "order 123456789 shipped").is_empty());
    }

    #[test]
    fn partial_ssn_last_four() {
        let found = spans(&SsnRecognizer, "SSN ending in 6789");
        assert_eq!(found, vec![("6789".to_string(), 0.7)]);
    }

    #[test]
    fn itin_requires_nine_prefix_and_valid_group() {
        assert_eq!(
            spans(&ItinRecognizer, "ITIN 912-70-1234"),
            vec![("912-70-1234".to_string(), 0.8)]
        );
        assert!(spans(&ItinRecognizer, "123-45-6789").is_empty());
        // Group 93 is not assigned
        assert!(spans(&ItinRecognizer, "912-93-1234").is_empty());
    }

    #[test]
    fn passport_needs_keyword() {
        assert_eq!(
            spans(&PassportRecognizer, "Passport No. 123456789"),
            vec![("123456789".to_string(), 0.85)]
        );
        assert!(spans(&PassportRecognizer, "call 123456789").is_empty());
    }

    #[test]
    fn drivers_license_shapes() {
        assert_eq!(
            spans(&DriversLicenseRecognizer, "Driver's License: D1234567"),
            vec![("D1234567".to_string(), 0.8)]
        );
        assert_eq!(
            spans(&DriversLicenseRecognizer, "DL 12345678"),
            vec![("12345678".to_string(), 0.7)]
        );
        assert!(spans(&DriversLicenseRecognizer, "room 12345678").is_empty());
    }
}
