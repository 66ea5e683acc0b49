use std::fs;
use std::path::PathBuf;

use crate::core::confidence::LOW_CONFIDENCE;
use crate::core::model::{Page, PageClass};
use crate::error::Result;
use crate::export::Exporter;
use crate::pipeline::{BatchOutcome, FileOutcome};

/// Single `review.html` with one row per scanned page, for checking the
/// pages the scan flagged.
#[derive(Debug, Clone)]
pub struct HtmlDebugExporter {
    out_dir: PathBuf,
}

impl HtmlDebugExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn page_to_row(file: &FileOutcome, page: &Page) -> String {
        let placement = file.resolution.placement(page.index);
        let (role, segment, confidence) = match placement {
            Some((segment, placed)) => (
                placed.role.label(),
                format!("{} / {}", segment.student_id, segment.document_type.title()),
                placed.confidence,
            ),
            None => ("none", String::new(), 0.0),
        };
        let status = if placement.is_none() {
            "unplaced"
        } else if confidence < LOW_CONFIDENCE {
            "flagged"
        } else {
            "ok"
        };
        format!(
            r#"<tr class='{status}' data-text='{text}'><td>{page}</td><td>{class}</td><td>{language}</td><td>{id}</td><td>{name}</td><td>{role}</td><td>{segment}</td><td>{confidence:.2}</td></tr>"#,
            status = status,
            text = html_escape::encode_single_quoted_attribute(&page.text),
            page = page.index + 1,
            class = class_label(page.class),
            language = page.language,
            id = html_escape::encode_text(page.student_id().unwrap_or("")),
            name = html_escape::encode_text(page.student_name().unwrap_or("")),
            role = role,
            segment = html_escape::encode_text(&segment),
            confidence = confidence,
        )
    }

    fn file_to_section(file: &FileOutcome) -> String {
        let rows = file
            .pages
            .iter()
            .map(|page| Self::page_to_row(file, page))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "<h2>{name}</h2>\n<table>\n<tr><th>Page</th><th>Type</th><th>Lang</th><th>Student ID</th><th>Name</th><th>Role</th><th>Segment</th><th>Confidence</th></tr>\n{rows}\n</table>\n",
            name = html_escape::encode_text(&file.file_name),
            rows = rows,
        )
    }
}

fn class_label(class: PageClass) -> &'static str {
    match class.document_type() {
        Some(doc) => doc.title(),
        None => "unclassified",
    }
}

impl Exporter for HtmlDebugExporter {
    fn export(&self, outcome: &BatchOutcome) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let sections = outcome
            .files
            .iter()
            .map(Self::file_to_section)
            .collect::<String>();

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>Packet Review</title>
<style>
body {{ margin: 20px; font-family: Arial, sans-serif; }}
table {{ border-collapse: collapse; margin-bottom: 30px; }}
th, td {{ border: 1px solid #ddd; padding: 4px 8px; font-size: 13px; }}
tr {{ cursor: pointer; }}
tr.flagged {{ background: rgba(255,165,0,0.2); }}
tr.unplaced {{ background: rgba(255,0,0,0.15); }}
#info {{ position: fixed; right: 10px; top: 10px; background: #fff; padding: 10px; border: 1px solid #ddd; max-width: 400px; max-height: 80%; overflow: auto; white-space: pre-wrap; }}
</style>
</head>
<body>
<div id='info'>Click a page to read its text.</div>
<p>{packets} complete packet(s), {incomplete} incomplete student(s), {failed} file(s) not processed.</p>
{sections}
<script>
const info = document.getElementById('info');
for (const row of document.querySelectorAll('tr[data-text]')) {{
  row.addEventListener('click', () => {{
    info.textContent = row.dataset.text;
  }});
}}
</script>
</body>
</html>"#,
            packets = outcome.assembly.packets.len(),
            incomplete = outcome.assembly.incomplete.len(),
            failed = outcome.failed.len(),
            sections = sections,
        );
        fs::write(self.out_dir.join("review.html"), html)?;
        Ok(())
    }
}
