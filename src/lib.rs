//! RedactQC - quality assurance for redacted legal documents.
//!
//! Scans folders of already-redacted PDF files and flags personally
//! identifiable information that redaction missed. Everything runs
//! locally: extraction and OCR happen in a worker pool, findings are
//! persisted to an embedded SQLite database, and results are served
//! through a localhost-only HTTP dashboard.

pub mod batch;
pub mod cli;
pub mod config;
pub mod detect;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod reports;
pub mod repository;
pub mod security;
pub mod server;
pub mod worker;
