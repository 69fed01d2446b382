//! Structural PII recognizers.
//!
//! Each recognizer proposes candidate spans with a base confidence;
//! the detector applies context adjustment, filtering and overlap
//! resolution afterwards. The registry is fixed at startup; there is
//! no runtime plugin loading.

mod datetime;
mod digital;
mod financial;
mod government;
mod legal;
mod medical;

pub use datetime::DateTimeRecognizer;
pub use digital::{
    DeviceIdRecognizer, EmailRecognizer, IpAddressRecognizer, MacAddressRecognizer,
    PhoneRecognizer, UrlRecognizer,
};
pub use financial::{BankAccountRecognizer, CreditCardRecognizer, RoutingNumberRecognizer};
pub use government::{
    DriversLicenseRecognizer, ItinRecognizer, PassportRecognizer, SsnRecognizer,
};
pub use legal::CaseNumberRecognizer;
pub use medical::MedicalRecordRecognizer;

/// A candidate span proposed by a recognizer (byte offsets).
#[derive(Debug, Clone)]
pub struct SpanMatch {
    pub pii_type: &'static str,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

impl SpanMatch {
    pub fn new(pii_type: &'static str, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            pii_type,
            start,
            end,
            confidence,
        }
    }
}

/// A module that proposes candidate PII spans in text.
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze(&self, text: &str) -> Vec<SpanMatch>;
}

/// The fixed recognizer set, in registration order.
pub fn registry() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(SsnRecognizer),
        Box::new(ItinRecognizer),
        Box::new(PassportRecognizer),
        Box::new(DriversLicenseRecognizer),
        Box::new(CreditCardRecognizer),
        Box::new(RoutingNumberRecognizer),
        Box::new(BankAccountRecognizer),
        Box::new(EmailRecognizer),
        Box::new(PhoneRecognizer),
        Box::new(IpAddressRecognizer),
        Box::new(UrlRecognizer),
        Box::new(MacAddressRecognizer),
        Box::new(DeviceIdRecognizer),
        Box::new(CaseNumberRecognizer),
        Box::new(MedicalRecordRecognizer),
        Box::new(DateTimeRecognizer),
    ]
}

/// Luhn check used by card numbers and IMEIs.
pub(crate) fn luhn_valid(digits: &str) -> bool {
    let digits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// ABA routing-number checksum: 3(d1+d4+d7) + 7(d2+d5+d8) + (d3+d6+d9)
/// must be divisible by 10.
pub(crate) fn aba_valid(digits: &str) -> bool {
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != 9 {
        return false;
    }
    let checksum = 3 * (d[0] + d[3] + d[6]) + 7 * (d[1] + d[4] + d[7]) + (d[2] + d[5] + d[8]);
    checksum % 10 == 0
}
