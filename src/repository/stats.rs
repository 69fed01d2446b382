//! Dashboard aggregates.

use serde::Serialize;

use super::{Result, Store};

/// Global counters across all batches.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_batches: u64,
    pub total_documents: u64,
    pub total_findings: u64,
    pub docs_with_findings: u64,
}

/// Per-type finding count with mean confidence.
#[derive(Debug, Clone, Serialize)]
pub struct PiiTypeStat {
    pub pii_type: String,
    pub count: u64,
    pub avg_confidence: f64,
}

impl Store {
    pub fn global_stats(&self) -> Result<GlobalStats> {
        let conn = self.reader()?;

        let total_batches: i64 =
            conn.query_row("SELECT COUNT(*) FROM batches", [], |row| row.get(0))?;
        let (total_documents, docs_with_findings): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN finding_count > 0 THEN 1 ELSE 0 END), 0) \
             FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let total_findings: i64 =
            conn.query_row("SELECT COUNT(*) FROM findings", [], |row| row.get(0))?;

        Ok(GlobalStats {
            total_batches: total_batches as u64,
            total_documents: total_documents as u64,
            total_findings: total_findings as u64,
            docs_with_findings: docs_with_findings as u64,
        })
    }

    /// Finding count and average confidence per PII type, most common
    /// first.
    pub fn pii_type_distribution(&self) -> Result<Vec<PiiTypeStat>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare(
            "SELECT pii_type, COUNT(*), AVG(confidence) FROM findings \
             GROUP BY pii_type ORDER BY COUNT(*) DESC, pii_type",
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(PiiTypeStat {
                    pii_type: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                    avg_confidence: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stats)
    }
}
