//! Batch rows: creation, lifecycle updates, listing, cascade delete.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use crate::models::{new_id, Batch, BatchStatus};

use super::{parse_datetime, Result, Store};

pub(crate) fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get(0)?,
        name: row.get(1)?,
        source_path: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        status: BatchStatus::parse(&row.get::<_, String>(4)?).unwrap_or(BatchStatus::Error),
        total_docs: row.get(5)?,
        processed_docs: row.get(6)?,
        docs_with_findings: row.get(7)?,
    })
}

const BATCH_COLUMNS: &str =
    "id, name, source_path, created_at, status, total_docs, processed_docs, docs_with_findings";

impl Store {
    /// Insert a new batch in `pending` state and return it.
    pub fn create_batch(&self, name: &str, source_path: &str) -> Result<Batch> {
        let batch = Batch {
            id: new_id(),
            name: name.to_string(),
            source_path: source_path.to_string(),
            created_at: Utc::now(),
            status: BatchStatus::Pending,
            total_docs: 0,
            processed_docs: 0,
            docs_with_findings: 0,
        };

        let conn = self.writer()?;
        conn.execute(
            "INSERT INTO batches (id, name, source_path, created_at, status) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                batch.id,
                batch.name,
                batch.source_path,
                batch.created_at.to_rfc3339(),
                batch.status.as_str(),
            ],
        )?;
        Ok(batch)
    }

    /// Insert a batch and its inventoried documents in one
    /// transaction, with `total_docs` already settled. Either the
    /// whole inventory lands or none of it does.
    pub fn create_batch_with_documents(
        &self,
        name: &str,
        source_path: &str,
        files: &[(String, String)],
    ) -> Result<Batch> {
        let batch = Batch {
            id: new_id(),
            name: name.to_string(),
            source_path: source_path.to_string(),
            created_at: Utc::now(),
            status: BatchStatus::Pending,
            total_docs: files.len() as i64,
            processed_docs: 0,
            docs_with_findings: 0,
        };

        let mut conn = self.writer()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO batches (id, name, source_path, created_at, status, total_docs) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                batch.id,
                batch.name,
                batch.source_path,
                batch.created_at.to_rfc3339(),
                batch.status.as_str(),
                batch.total_docs,
            ],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (id, batch_id, filename, filepath) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (filename, filepath) in files {
                stmt.execute(params![new_id(), batch.id, filename, filepath])?;
            }
        }
        tx.commit()?;
        Ok(batch)
    }

    pub fn get_batch(&self, batch_id: &str) -> Result<Batch> {
        let conn = self.reader()?;
        conn.query_row(
            &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ?1"),
            params![batch_id],
            batch_from_row,
        )
        .optional()?
        .ok_or(super::RepositoryError::NotFound)
    }

    /// All batches, newest first.
    pub fn list_batches(&self) -> Result<Vec<Batch>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BATCH_COLUMNS} FROM batches ORDER BY created_at DESC, id DESC"
        ))?;
        let batches = stmt
            .query_map([], batch_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(batches)
    }

    pub fn set_batch_status(&self, batch_id: &str, status: BatchStatus) -> Result<()> {
        let conn = self.writer()?;
        let changed = conn.execute(
            "UPDATE batches SET status = ?1 WHERE id = ?2",
            params![status.as_str(), batch_id],
        )?;
        if changed == 0 {
            return Err(super::RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a batch; documents and findings go with it via cascade.
    pub fn delete_batch(&self, batch_id: &str) -> Result<()> {
        let conn = self.writer()?;
        let changed = conn.execute("DELETE FROM batches WHERE id = ?1", params![batch_id])?;
        if changed == 0 {
            return Err(super::RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_store;
    use super::*;
    use crate::repository::RepositoryError;

    #[test]
    fn create_and_get_round_trip() {
        let (store, _dir) = temp_store();
        let batch = store.create_batch("warrants-2026", "/evidence/warrants").unwrap();
        let loaded = store.get_batch(&batch.id).unwrap();
        assert_eq!(loaded.name, "warrants-2026");
        assert_eq!(loaded.status, BatchStatus::Pending);
        assert_eq!(loaded.total_docs, 0);
    }

    #[test]
    fn get_missing_batch_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.get_batch("nope"),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn list_orders_newest_first() {
        let (store, _dir) = temp_store();
        let a = store.create_batch("a", "/x").unwrap();
        let b = store.create_batch("b", "/y").unwrap();
        let listed = store.list_batches().unwrap();
        assert_eq!(listed.len(), 2);
        // Same-second creation falls back to id ordering; both must be present.
        let ids: Vec<&str> = listed.iter().map(|x| x.id.as_str()).collect();
        assert!(ids.contains(&a.id.as_str()));
        assert!(ids.contains(&b.id.as_str()));
    }

    #[test]
    fn status_transitions_persist() {
        let (store, _dir) = temp_store();
        let batch = store.create_batch("a", "/x").unwrap();
        store
            .set_batch_status(&batch.id, BatchStatus::Processing)
            .unwrap();
        assert_eq!(
            store.get_batch(&batch.id).unwrap().status,
            BatchStatus::Processing
        );
        store
            .set_batch_status(&batch.id, BatchStatus::Completed)
            .unwrap();
        assert_eq!(
            store.get_batch(&batch.id).unwrap().status,
            BatchStatus::Completed
        );
    }

    #[test]
    fn combined_creation_lands_batch_and_documents_together() {
        let (store, _dir) = temp_store();
        let files = vec![
            ("a.pdf".to_string(), "/src/a.pdf".to_string()),
            ("b.pdf".to_string(), "/src/b.pdf".to_string()),
        ];
        let batch = store
            .create_batch_with_documents("combined", "/src", &files)
            .unwrap();
        assert_eq!(batch.total_docs, 2);

        let loaded = store.get_batch(&batch.id).unwrap();
        assert_eq!(loaded.total_docs, 2);
        let docs = store
            .list_documents(&batch.id, &Default::default(), 1, 50)
            .unwrap();
        assert_eq!(docs.total, 2);
    }

    #[test]
    fn delete_missing_batch_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.delete_batch("nope"),
            Err(RepositoryError::NotFound)
        ));
    }
}
