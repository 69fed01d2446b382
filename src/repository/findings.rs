//! Finding queries.

use rusqlite::{params, OptionalExtension, Row};

use crate::models::Finding;

use super::{Page, RepositoryError, Result, Store};

/// Optional filters for finding listings.
#[derive(Debug, Clone, Default)]
pub struct FindingFilter {
    pub pii_type: Option<String>,
    pub min_confidence: Option<f64>,
}

pub(crate) fn finding_from_row(row: &Row<'_>) -> rusqlite::Result<Finding> {
    Ok(Finding {
        id: row.get(0)?,
        document_id: row.get(1)?,
        page_number: row.get(2)?,
        pii_type: row.get(3)?,
        confidence: row.get(4)?,
        char_offset: row.get(5)?,
        char_length: row.get(6)?,
        context_snippet: row.get(7)?,
    })
}

impl Store {
    /// Paginated findings for one document, ordered by page then
    /// offset. `page` is 1-based.
    pub fn list_findings(
        &self,
        doc_id: &str,
        filter: &FindingFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Page<Finding>> {
        let conn = self.reader()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM documents WHERE id = ?1",
                params![doc_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut conditions = vec!["document_id = ?1".to_string()];
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(doc_id.to_string())];

        if let Some(pii_type) = &filter.pii_type {
            values.push(Box::new(pii_type.clone()));
            conditions.push(format!("pii_type = ?{}", values.len()));
        }
        if let Some(min_confidence) = filter.min_confidence {
            values.push(Box::new(min_confidence));
            conditions.push(format!("confidence >= ?{}", values.len()));
        }

        let where_clause = conditions.join(" AND ");
        let value_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM findings WHERE {where_clause}"),
            value_refs.as_slice(),
            |row| row.get(0),
        )?;

        let offset = page.saturating_sub(1) * page_size;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, document_id, page_number, pii_type, confidence, \
             char_offset, char_length, context_snippet \
             FROM findings WHERE {where_clause} \
             ORDER BY page_number, char_offset LIMIT {page_size} OFFSET {offset}"
        ))?;
        let items = stmt
            .query_map(value_refs.as_slice(), finding_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: total as u64,
        })
    }

    /// Every finding of a batch joined with its document filename,
    /// ordered for report output.
    pub fn findings_for_batch(&self, batch_id: &str) -> Result<Vec<(String, Finding)>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(
            "SELECT d.filename, f.id, f.document_id, f.page_number, f.pii_type, \
             f.confidence, f.char_offset, f.char_length, f.context_snippet \
             FROM findings f JOIN documents d ON f.document_id = d.id \
             WHERE d.batch_id = ?1 \
             ORDER BY d.filename, f.page_number, f.char_offset",
        )?;
        let rows = stmt
            .query_map(params![batch_id], |row| {
                let filename: String = row.get(0)?;
                let finding = Finding {
                    id: row.get(1)?,
                    document_id: row.get(2)?,
                    page_number: row.get(3)?,
                    pii_type: row.get(4)?,
                    confidence: row.get(5)?,
                    char_offset: row.get(6)?,
                    char_length: row.get(7)?,
                    context_snippet: row.get(8)?,
                };
                Ok((filename, finding))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_store;
    use super::*;
    use crate::models::{DocumentStatus, FindingDraft};

    fn draft(page: u32, pii_type: &str, confidence: f64, offset: usize) -> FindingDraft {
        FindingDraft {
            page_number: page,
            pii_type: pii_type.to_string(),
            confidence,
            char_offset: offset,
            char_length: 9,
            context_snippet: "ctx".to_string(),
        }
    }

    fn seeded_doc(store: &super::super::Store) -> (String, String) {
        let batch = store.create_batch("b", "/src").unwrap();
        let ids = store
            .insert_documents(&batch.id, &[("a.pdf".into(), "/src/a.pdf".into())])
            .unwrap();
        store
            .record_document_result(
                &ids[0],
                3,
                DocumentStatus::Completed,
                &[
                    draft(2, "US_SSN", 0.95, 10),
                    draft(1, "EMAIL_ADDRESS", 0.6, 40),
                    draft(1, "EMAIL_ADDRESS", 0.9, 5),
                ],
            )
            .unwrap();
        (batch.id, ids[0].clone())
    }

    #[test]
    fn findings_ordered_by_page_then_offset() {
        let (store, _dir) = temp_store();
        let (_, doc_id) = seeded_doc(&store);
        let page = store
            .list_findings(&doc_id, &Default::default(), 1, 50)
            .unwrap();
        assert_eq!(page.total, 3);
        let keys: Vec<(i64, i64)> = page
            .items
            .iter()
            .map(|f| (f.page_number, f.char_offset))
            .collect();
        assert_eq!(keys, vec![(1, 5), (1, 40), (2, 10)]);
    }

    #[test]
    fn filters_apply() {
        let (store, _dir) = temp_store();
        let (_, doc_id) = seeded_doc(&store);

        let ssn = store
            .list_findings(
                &doc_id,
                &FindingFilter {
                    pii_type: Some("US_SSN".into()),
                    min_confidence: None,
                },
                1,
                50,
            )
            .unwrap();
        assert_eq!(ssn.total, 1);

        let confident = store
            .list_findings(
                &doc_id,
                &FindingFilter {
                    pii_type: Some("EMAIL_ADDRESS".into()),
                    min_confidence: Some(0.8),
                },
                1,
                50,
            )
            .unwrap();
        assert_eq!(confident.total, 1);
        assert_eq!(confident.items[0].char_offset, 5);
    }

    #[test]
    fn listing_missing_document_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.list_findings("nope", &Default::default(), 1, 50),
            Err(super::super::RepositoryError::NotFound)
        ));
    }

    #[test]
    fn batch_findings_join_filenames() {
        let (store, _dir) = temp_store();
        let (batch_id, _) = seeded_doc(&store);
        let rows = store.findings_for_batch(&batch_id).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|(filename, _)| filename == "a.pdf"));
    }
}
