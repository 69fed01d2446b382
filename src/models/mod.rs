//! Core entities: batches, documents, findings and PII categories.
//!
//! All identifiers are opaque 128-bit values rendered as 32 lowercase
//! hex characters. Timestamps are UTC and serialize as RFC 3339.

mod pii;

pub use pii::{severity_for, PiiCategory, PII_CATEGORIES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a new opaque entity id (lowercase hex, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Lifecycle state of a batch scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A scan job over one source folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub name: String,
    pub source_path: String,
    pub created_at: DateTime<Utc>,
    pub status: BatchStatus,
    pub total_docs: i64,
    pub processed_docs: i64,
    pub docs_with_findings: i64,
}

/// Processing state of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Completed,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Terminal states count toward a batch's processed counter.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One PDF file within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub batch_id: String,
    pub filename: String,
    pub filepath: String,
    /// Known after the first extraction attempt; 0 until then.
    pub page_count: i64,
    pub status: DocumentStatus,
    pub finding_count: i64,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A finding produced by the pipeline, not yet persisted.
///
/// Carries everything the store needs to write a [`Finding`] row; ids
/// are assigned at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingDraft {
    pub page_number: u32,
    pub pii_type: String,
    pub confidence: f64,
    pub char_offset: usize,
    pub char_length: usize,
    pub context_snippet: String,
}

/// One detected PII instance on one page of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub document_id: String,
    /// 1-based page number.
    pub page_number: i64,
    pub pii_type: String,
    pub confidence: f64,
    /// Byte offset into the page text as extracted.
    pub char_offset: i64,
    pub char_length: i64,
    pub context_snippet: String,
}
