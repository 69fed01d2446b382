//! Flat CSV export: one row per finding, batch and document columns
//! denormalised for spreadsheet use.

use std::path::Path;

use crate::models::Batch;
use crate::repository::Store;

use super::GenerateError;

pub(crate) fn write_csv(store: &Store, batch: &Batch, path: &Path) -> Result<(), GenerateError> {
    let rows = store.findings_for_batch(&batch.id)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "batch_name",
        "document_filename",
        "page_number",
        "pii_type",
        "confidence",
        "context_snippet",
        "char_offset",
        "char_length",
    ])?;

    for (filename, finding) in rows {
        let record = [
            batch.name.clone(),
            filename,
            finding.page_number.to_string(),
            finding.pii_type,
            format!("{:.4}", finding.confidence),
            finding.context_snippet,
            finding.char_offset.to_string(),
            finding.char_length.to_string(),
        ];
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentStatus, FindingDraft};
    use crate::repository::Store;
    use std::sync::Arc;

    #[test]
    fn quoting_survives_commas_and_newlines_in_snippets() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(&dir.path().join("db")).unwrap());
        let batch = store.create_batch("b", "/src").unwrap();
        let ids = store
            .insert_documents(&batch.id, &[("a.pdf".into(), "/src/a.pdf".into())])
            .unwrap();
        store
            .record_document_result(
                &ids[0],
                1,
                DocumentStatus::Completed,
                &[FindingDraft {
                    page_number: 1,
                    pii_type: "EMAIL_ADDRESS".into(),
                    confidence: 0.9,
                    char_offset: 0,
                    char_length: 5,
                    context_snippet: "with, commas and \"quotes\"".into(),
                }],
            )
            .unwrap();

        let out = dir.path().join("out.csv");
        write_csv(&store, &store.get_batch(&batch.id).unwrap(), &out).unwrap();

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[5], "with, commas and \"quotes\"");
    }
}
