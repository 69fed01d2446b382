//! Digital identifiers: email, phone, IP, URL, MAC, device IDs.

use std::sync::LazyLock;

use regex::Regex;

use super::{luhn_valid, Recognizer, SpanMatch};

pub struct EmailRecognizer;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

impl Recognizer for EmailRecognizer {
    fn name(&self) -> &'static str {
        "email"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        EMAIL
            .find_iter(text)
            .map(|m| SpanMatch::new("EMAIL_ADDRESS", m.start(), m.end(), 0.9))
            .collect()
    }
}

/// North American phone numbers. Separators are required so digit runs
/// inside longer numbers (cards, account numbers) never qualify.
pub struct PhoneRecognizer;

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    // No leading \b: it would reject the "(555) ..." form, where the
    // match starts on a parenthesis.
    Regex::new(r"(?:\+?1[-.\s])?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b").unwrap()
});

impl Recognizer for PhoneRecognizer {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        PHONE
            .find_iter(text)
            .map(|m| SpanMatch::new("PHONE_NUMBER", m.start(), m.end(), 0.75))
            .collect()
    }
}

pub struct IpAddressRecognizer;

static IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b")
        .unwrap()
});

static IPV6: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9A-Fa-f]{1,4}:){2,7}[0-9A-Fa-f]{1,4}\b").unwrap()
});

impl Recognizer for IpAddressRecognizer {
    fn name(&self) -> &'static str {
        "ip_address"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches: Vec<SpanMatch> = IPV4
            .find_iter(text)
            .map(|m| SpanMatch::new("IP_ADDRESS", m.start(), m.end(), 0.8))
            .collect();
        matches.extend(
            IPV6.find_iter(text)
                .map(|m| SpanMatch::new("IP_ADDRESS", m.start(), m.end(), 0.6)),
        );
        matches
    }
}

pub struct UrlRecognizer;

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bhttps?://[^\s<>"]+|\bwww\.[^\s<>"]+"#).unwrap()
});

impl Recognizer for UrlRecognizer {
    fn name(&self) -> &'static str {
        "url"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        URL.find_iter(text)
            .map(|m| SpanMatch::new("URL", m.start(), m.end(), 0.6))
            .collect()
    }
}

pub struct MacAddressRecognizer;

static MAC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}\b|\b[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5}\b")
        .unwrap()
});

impl Recognizer for MacAddressRecognizer {
    fn name(&self) -> &'static str {
        "mac_address"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        MAC.find_iter(text)
            .map(|m| SpanMatch::new("MAC_ADDRESS", m.start(), m.end(), 0.8))
            .collect()
    }
}

/// Device identifiers: IMEIs (15 digits, Luhn-checked) and serial
/// numbers near device keywords. A bare Luhn-valid 15-digit run scores
/// low and only survives when context lifts it.
pub struct DeviceIdRecognizer;

static IMEI_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIMEI[\s#:.]*(\d{15})\b").unwrap());

static FIFTEEN_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{15}\b").unwrap());

static SERIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:serial\s+(?:number|no\.?)|S/N|SN)[\s#:.]*([A-Z0-9]{6,20})\b").unwrap()
});

static DEVICE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:device\s+(?:id|identifier)|MEID|ESN)[\s#:.]*([A-Z0-9]{8,18})\b").unwrap()
});

impl Recognizer for DeviceIdRecognizer {
    fn name(&self) -> &'static str {
        "device_id"
    }

    fn analyze(&self, text: &str) -> Vec<SpanMatch> {
        let mut matches = Vec::new();

        for cap in IMEI_KEYWORD.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                if luhn_valid(m.as_str()) {
                    matches.push(SpanMatch::new("DEVICE_ID", m.start(), m.end(), 0.9));
                }
            }
        }

        for m in FIFTEEN_DIGITS.find_iter(text) {
            if !luhn_valid(m.as_str()) {
                continue;
            }
            if matches
                .iter()
                .any(|existing: &SpanMatch| existing.start == m.start())
            {
                continue;
            }
            matches.push(SpanMatch::new("DEVICE_ID", m.start(), m.end(), 0.3));
        }

        for pattern in [&*SERIAL, &*DEVICE_KEYWORD] {
            for cap in pattern.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    matches.push(SpanMatch::new("DEVICE_ID", m.start(), m.end(), 0.75));
                }
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surfaces(r: &dyn Recognizer, text: &str) -> Vec<String> {
        r.analyze(text)
            .into_iter()
            .map(|m| text[m.start..m.end].to_string())
            .collect()
    }

    #[test]
    fn email_addresses() {
        assert_eq!(
            surfaces(&EmailRecognizer, "reach john@example.com today"),
            vec!["john@example.com"]
        );
        assert!(surfaces(&EmailRecognizer, "no at sign here").is_empty());
    }

    #[test]
    fn phone_numbers() {
        assert_eq!(
            surfaces(&PhoneRecognizer, "call 555-123-4567 now"),
            vec!["555-123-4567"]
        );
        assert_eq!(
            surfaces(&PhoneRecognizer, "call (555) 123-4567"),
            vec!["(555) 123-4567"]
        );
    }

    #[test]
    fn phone_needs_separators() {
        // Grouped card digits must not read as phone numbers.
        assert!(surfaces(&PhoneRecognizer, "4111 1111 1111 1112").is_empty());
        // An SSN's 3-2-4 grouping is not a phone shape either.
        assert!(surfaces(&PhoneRecognizer, "123-45-6789").is_empty());
    }

    #[test]
    fn ipv4_octets_validated() {
        assert_eq!(
            surfaces(&IpAddressRecognizer, "from 192.168.1.254"),
            vec!["192.168.1.254"]
        );
        assert!(surfaces(&IpAddressRecognizer, "version 999.1.2.3 here")
            .is_empty());
    }

    #[test]
    fn urls() {
        assert_eq!(
            surfaces(&UrlRecognizer, "see https://court.example.gov/docket?id=1"),
            vec!["https://court.example.gov/docket?id=1"]
        );
        assert_eq!(
            surfaces(&UrlRecognizer, "visit www.example.org soon"),
            vec!["www.example.org"]
        );
        // Bare domains are not enough
        assert!(surfaces(&UrlRecognizer, "domain example.com only").is_empty());
    }

    #[test]
    fn mac_addresses_both_separators() {
        assert_eq!(
            surfaces(&MacAddressRecognizer, "nic AA:BB:CC:DD:EE:FF up"),
            vec!["AA:BB:CC:DD:EE:FF"]
        );
        assert_eq!(
            surfaces(&MacAddressRecognizer, "nic aa-bb-cc-dd-ee-ff up"),
            vec!["aa-bb-cc-dd-ee-ff"]
        );
    }

    #[test]
    fn imei_requires_luhn() {
        let found = DeviceIdRecognizer.analyze("IMEI: 490154203237518");
        assert_eq!(found.len(), 1);
        assert!((found[0].confidence - 0.9).abs() < 1e-9);

        assert!(DeviceIdRecognizer
            .analyze("IMEI: 490154203237519")
            .is_empty());
    }

    #[test]
    fn bare_imei_scores_low() {
        let found = DeviceIdRecognizer.analyze("ref 490154203237518 noted");
        assert_eq!(found.len(), 1);
        assert!((found[0].confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn serial_numbers_need_keyword() {
        let text = "Serial No. ABC123XYZ";
        let found = surfaces(&DeviceIdRecognizer, text);
        assert_eq!(found, vec!["ABC123XYZ"]);
    }
}
