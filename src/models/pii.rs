//! Static PII category reference data.
//!
//! Severity levels (1-5) tag how sensitive a category is and break
//! ties when overlapping findings of different types are reconciled.

use serde::Serialize;

/// A seeded PII category row.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PiiCategory {
    pub name: &'static str,
    pub description: &'static str,
    pub severity_level: u8,
}

/// The fixed category table, seeded into the store on first open.
pub const PII_CATEGORIES: &[PiiCategory] = &[
    PiiCategory {
        name: "US_SSN",
        description: "US Social Security Number",
        severity_level: 5,
    },
    PiiCategory {
        name: "US_ITIN",
        description: "Individual Taxpayer Identification Number",
        severity_level: 5,
    },
    PiiCategory {
        name: "CREDIT_CARD",
        description: "Credit or debit card number",
        severity_level: 5,
    },
    PiiCategory {
        name: "US_BANK_NUMBER",
        description: "US bank account number",
        severity_level: 5,
    },
    PiiCategory {
        name: "BANK_ACCOUNT",
        description: "Account number near a finance context word",
        severity_level: 5,
    },
    PiiCategory {
        name: "US_PASSPORT",
        description: "US passport number",
        severity_level: 5,
    },
    PiiCategory {
        name: "US_DRIVER_LICENSE",
        description: "US driver's license number",
        severity_level: 5,
    },
    PiiCategory {
        name: "LEGAL_ROLE_NAME",
        description: "Judge, attorney, victim, witness, or minor name",
        severity_level: 5,
    },
    PiiCategory {
        name: "MEDICAL_RECORD",
        description: "Medical record or patient ID",
        severity_level: 5,
    },
    PiiCategory {
        name: "ROUTING_NUMBER",
        description: "Bank routing number",
        severity_level: 4,
    },
    PiiCategory {
        name: "PERSON",
        description: "Full or partial person name",
        severity_level: 4,
    },
    PiiCategory {
        name: "EMAIL_ADDRESS",
        description: "Email address",
        severity_level: 3,
    },
    PiiCategory {
        name: "PHONE_NUMBER",
        description: "Phone or fax number",
        severity_level: 3,
    },
    PiiCategory {
        name: "LOCATION",
        description: "Physical address or location",
        severity_level: 3,
    },
    PiiCategory {
        name: "CASE_NUMBER",
        description: "Legal case or docket number",
        severity_level: 3,
    },
    PiiCategory {
        name: "IP_ADDRESS",
        description: "IPv4 or IPv6 address",
        severity_level: 2,
    },
    PiiCategory {
        name: "MAC_ADDRESS",
        description: "Network MAC address",
        severity_level: 2,
    },
    PiiCategory {
        name: "DEVICE_ID",
        description: "Device serial or IMEI",
        severity_level: 2,
    },
    PiiCategory {
        name: "DATE_TIME",
        description: "Date or time expression",
        severity_level: 1,
    },
    PiiCategory {
        name: "URL",
        description: "Web URL",
        severity_level: 1,
    },
];

/// Severity for a PII type; unknown types rank lowest.
pub fn severity_for(pii_type: &str) -> u8 {
    PII_CATEGORIES
        .iter()
        .find(|c| c.name == pii_type)
        .map(|c| c.severity_level)
        .unwrap_or(1)
}
