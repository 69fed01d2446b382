//! Document rows: inventory inserts, result recording, paginated queries.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::models::{new_id, Document, DocumentStatus, FindingDraft};

use super::{parse_datetime_opt, Page, RepositoryError, Result, Store};

/// Optional filters for document listings.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Only documents with at least one finding of this type.
    pub pii_type: Option<String>,
    /// Only documents with at least one finding at or above this confidence.
    pub min_confidence: Option<f64>,
    /// Restrict to documents with (or without) findings.
    pub has_findings: Option<bool>,
}

pub(crate) fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        batch_id: row.get(1)?,
        filename: row.get(2)?,
        filepath: row.get(3)?,
        page_count: row.get(4)?,
        status: DocumentStatus::parse(&row.get::<_, String>(5)?).unwrap_or(DocumentStatus::Error),
        finding_count: row.get(6)?,
        processed_at: parse_datetime_opt(row.get(7)?),
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, batch_id, filename, filepath, page_count, status, finding_count, processed_at";

impl Store {
    /// Insert the inventoried documents for a batch in one transaction
    /// and set the batch's `total_docs`. Returns the new document ids
    /// in input order.
    pub fn insert_documents(
        &self,
        batch_id: &str,
        files: &[(String, String)],
    ) -> Result<Vec<String>> {
        let mut conn = self.writer()?;
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM batches WHERE id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut ids = Vec::with_capacity(files.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (id, batch_id, filename, filepath) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (filename, filepath) in files {
                let id = new_id();
                stmt.execute(params![id, batch_id, filename, filepath])?;
                ids.push(id);
            }
        }

        tx.execute(
            "UPDATE batches SET total_docs = \
             (SELECT COUNT(*) FROM documents WHERE batch_id = ?1) WHERE id = ?1",
            params![batch_id],
        )?;

        tx.commit()?;
        Ok(ids)
    }

    /// The next unprocessed document of a batch, by filename order.
    /// Serialized through the writer so concurrent callers never claim
    /// the same row.
    pub fn claim_next_pending(&self, batch_id: &str) -> Result<Option<(String, String)>> {
        let conn = self.writer()?;
        let row = conn
            .query_row(
                "SELECT id, filepath FROM documents \
                 WHERE batch_id = ?1 AND status = 'pending' \
                 ORDER BY filename LIMIT 1",
                params![batch_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// Documents still needing work when a batch is (re)started:
    /// `pending` plus `error`, by filename order.
    pub fn resumable_documents(&self, batch_id: &str) -> Result<Vec<(String, String)>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(
            "SELECT id, filepath FROM documents \
             WHERE batch_id = ?1 AND status IN ('pending', 'error') \
             ORDER BY filename",
        )?;
        let rows = stmt
            .query_map(params![batch_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Record the outcome of processing one document.
    ///
    /// In a single transaction: deletes any prior findings, writes the
    /// new set, updates the document row (including `processed_at`),
    /// and recomputes the owning batch's counters so they are exact at
    /// the commit boundary. An `error` outcome must carry no findings.
    pub fn record_document_result(
        &self,
        doc_id: &str,
        page_count: u32,
        status: DocumentStatus,
        findings: &[FindingDraft],
    ) -> Result<()> {
        if status == DocumentStatus::Error && !findings.is_empty() {
            return Err(RepositoryError::Constraint(
                "an errored document cannot carry findings",
            ));
        }

        let mut conn = self.writer()?;
        let tx = conn.transaction()?;

        let batch_id: Option<String> = tx
            .query_row(
                "SELECT batch_id FROM documents WHERE id = ?1",
                params![doc_id],
                |row| row.get(0),
            )
            .optional()?;
        let batch_id = batch_id.ok_or(RepositoryError::NotFound)?;

        tx.execute(
            "DELETE FROM findings WHERE document_id = ?1",
            params![doc_id],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO findings \
                 (id, document_id, page_number, pii_type, confidence, \
                  char_offset, char_length, context_snippet) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for f in findings {
                stmt.execute(params![
                    new_id(),
                    doc_id,
                    f.page_number,
                    f.pii_type,
                    f.confidence,
                    f.char_offset as i64,
                    f.char_length as i64,
                    f.context_snippet,
                ])?;
            }
        }

        tx.execute(
            "UPDATE documents SET status = ?1, page_count = ?2, \
             finding_count = ?3, processed_at = ?4 WHERE id = ?5",
            params![
                status.as_str(),
                page_count,
                findings.len() as i64,
                Utc::now().to_rfc3339(),
                doc_id,
            ],
        )?;

        tx.execute(
            "UPDATE batches SET \
             processed_docs = (SELECT COUNT(*) FROM documents \
                               WHERE batch_id = ?1 AND status IN ('completed', 'error')), \
             docs_with_findings = (SELECT COUNT(*) FROM documents \
                                   WHERE batch_id = ?1 AND finding_count > 0) \
             WHERE id = ?1",
            params![batch_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_document(&self, doc_id: &str) -> Result<Document> {
        let conn = self.reader()?;
        conn.query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"),
            params![doc_id],
            document_from_row,
        )
        .optional()?
        .ok_or(RepositoryError::NotFound)
    }

    /// Paginated document listing for a batch. `page` is 1-based.
    pub fn list_documents(
        &self,
        batch_id: &str,
        filter: &DocumentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Document>> {
        let conn = self.reader()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM batches WHERE id = ?1",
                params![batch_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut conditions = vec!["d.batch_id = ?1".to_string()];
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(batch_id.to_string())];

        match filter.has_findings {
            Some(true) => conditions.push("d.finding_count > 0".to_string()),
            Some(false) => conditions.push("d.finding_count = 0".to_string()),
            None => {}
        }

        if let Some(pii_type) = &filter.pii_type {
            values.push(Box::new(pii_type.clone()));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM findings f WHERE f.document_id = d.id \
                 AND f.pii_type = ?{})",
                values.len()
            ));
        }

        if let Some(min_confidence) = filter.min_confidence {
            values.push(Box::new(min_confidence));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM findings f WHERE f.document_id = d.id \
                 AND f.confidence >= ?{})",
                values.len()
            ));
        }

        let where_clause = conditions.join(" AND ");
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM documents d WHERE {where_clause}"),
            value_refs.as_slice(),
            |row| row.get(0),
        )?;

        let offset = page.saturating_sub(1) * page_size;
        let mut stmt = conn.prepare(&format!(
            "SELECT d.id, d.batch_id, d.filename, d.filepath, d.page_count, \
             d.status, d.finding_count, d.processed_at \
             FROM documents d WHERE {where_clause} \
             ORDER BY d.filename LIMIT {page_size} OFFSET {offset}"
        ))?;
        let items = stmt
            .query_map(value_refs.as_slice(), document_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }
}
