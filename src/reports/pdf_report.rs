//! PDF summary report, written directly with lopdf.
//!
//! Layout is deliberately plain: a Courier summary block followed by
//! one line per finding, paginated. Reviewers print these.

use std::path::Path;

use lopdf::{dictionary, Document, Object, Stream};

use crate::models::Batch;
use crate::repository::Store;

use super::GenerateError;

const LINES_PER_PAGE: usize = 52;
const FONT_SIZE: i64 = 9;
const TITLE_SIZE: i64 = 16;
const LEFT_MARGIN: i64 = 50;
const TOP_START: i64 = 740;
const LINE_HEIGHT: i64 = 13;

pub(crate) fn write_pdf(store: &Store, batch: &Batch, path: &Path) -> Result<(), GenerateError> {
    let rows = store.findings_for_batch(&batch.id)?;

    let mut lines = vec![
        format!("Batch:              {}", batch.name),
        format!("Source folder:      {}", batch.source_path),
        format!("Created:            {}", batch.created_at.to_rfc3339()),
        format!("Status:             {}", batch.status.as_str()),
        format!("Documents:          {}", batch.total_docs),
        format!("Processed:          {}", batch.processed_docs),
        format!("With findings:      {}", batch.docs_with_findings),
        format!("Total findings:     {}", rows.len()),
        String::new(),
        format!(
            "{:<28} {:>4}  {:<20} {:>5}",
            "document", "page", "type", "conf"
        ),
        "-".repeat(64),
    ];

    for (filename, finding) in &rows {
        lines.push(format!(
            "{:<28} {:>4}  {:<20} {:>5.2}",
            truncate(filename, 28),
            finding.page_number,
            truncate(&finding.pii_type, 20),
            finding.confidence,
        ));
    }

    let mut doc = build_document("RedactQC Findings Report", &lines);
    doc.save(path)?;
    Ok(())
}

/// Assemble a multi-page Courier document: a title on the first page,
/// then `lines` flowed at a fixed leading.
fn build_document(title: &str, lines: &[String]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<Object> = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    for (page_index, chunk) in chunks.iter().enumerate() {
        let mut content = String::new();
        let mut y = TOP_START;

        if page_index == 0 {
            content.push_str(&format!(
                "BT /F1 {TITLE_SIZE} Tf {LEFT_MARGIN} {y} Td ({}) Tj ET\n",
                escape_pdf_string(title)
            ));
            y -= 2 * LINE_HEIGHT;
        }

        for line in *chunk {
            content.push_str(&format!(
                "BT /F1 {FONT_SIZE} Tf {LEFT_MARGIN} {y} Td ({}) Tj ET\n",
                escape_pdf_string(line)
            ));
            y -= LINE_HEIGHT;
        }

        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());
    }

    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '(' => vec!['\\', '('],
            ')' => vec!['\\', ')'],
            '\\' => vec!['\\', '\\'],
            c if c.is_ascii_graphic() || c == ' ' => vec![c],
            // Courier is Latin-1; anything else degrades to '?'
            _ => vec!['?'],
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while cut > 0 && !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s[..cut].to_string()
    }
}
