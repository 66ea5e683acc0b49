use std::fs;
use std::path::PathBuf;

use crate::core::model::{StudentPacket, CANONICAL_ORDER};
use crate::error::Result;
use crate::export::{packet_file_stems, Exporter};
use crate::pipeline::{BatchOutcome, BatchReport};

pub const REPORT_FILE_NAME: &str = "INCOMPLETE_PAPERWORK_REPORT.txt";

#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_report(report: &BatchReport) -> String {
        let mut text = String::new();
        text.push_str("RECLASSIFICATION PAPERWORK - INCOMPLETE SETS REPORT\n");
        text.push_str(&format!("{}\n\n", "=".repeat(60)));
        text.push_str(&format!("Complete packets: {}\n", report.packets));
        text.push_str(&format!(
            "SUMMARY: {} student(s) with incomplete paperwork\n",
            report.incomplete.len()
        ));
        text.push_str(&format!("{}\n\n", "-".repeat(60)));

        if report.incomplete.is_empty() {
            text.push_str("All students have complete paperwork.\n\n");
        }

        for (i, entry) in report.incomplete.iter().enumerate() {
            text.push_str(&format!("{}. STUDENT ID: {}\n", i + 1, entry.student_id));
            text.push_str(&format!("   Name: {}\n", entry.student_name));
            text.push_str(&format!("   Files: {}\n", entry.file_names.join(", ")));
            text.push_str(&format!("   Found Documents ({}):\n", entry.found.len()));
            for doc in &entry.found {
                text.push_str(&format!("      [x] {}\n", doc.title()));
            }
            text.push_str(&format!("   Missing Documents ({}):\n", entry.missing.len()));
            for doc in &entry.missing {
                text.push_str(&format!("      [ ] {}\n", doc.title()));
            }
            text.push_str(&format!("   Total Pages Found: {}\n", entry.total_pages));
            text.push_str(&format!("\n{}\n\n", "-".repeat(40)));
        }

        text.push_str("MISSING DOCUMENTS SUMMARY:\n");
        text.push_str(&format!("{}\n", "-".repeat(30)));
        for doc in CANONICAL_ORDER {
            let count = report
                .incomplete
                .iter()
                .filter(|entry| entry.missing.contains(&doc))
                .count();
            text.push_str(&format!("* {}: {} student(s) missing\n", doc.title(), count));
        }

        if !report.unclassified.is_empty() {
            text.push_str("\nUNCLASSIFIED PAGES:\n");
            for page in &report.unclassified {
                text.push_str(&format!(
                    "* {} page {} ({}): {}\n",
                    page.file_name,
                    page.page_index + 1,
                    page.language,
                    page.reason
                ));
            }
        }

        if !report.ambiguous.is_empty() {
            text.push_str("\nPAGES TO REVIEW:\n");
            for page in &report.ambiguous {
                text.push_str(&format!(
                    "* {} page {} ({}): attached to {} {} with confidence {:.2}\n",
                    page.file_name,
                    page.page_index + 1,
                    page.language,
                    page.assigned_to.student_id,
                    page.assigned_to.document_type.title(),
                    page.confidence
                ));
            }
        }

        if !report.duplicates.is_empty() {
            text.push_str("\nDUPLICATE FORMS (not included in packets):\n");
            for duplicate in &report.duplicates {
                let pages = duplicate
                    .pages
                    .iter()
                    .map(|index| (index + 1).to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                text.push_str(&format!(
                    "* {} {} in {} pages {}\n",
                    duplicate.student_id,
                    duplicate.document_type.title(),
                    duplicate.file_name,
                    pages
                ));
            }
        }

        if !report.failed.is_empty() {
            text.push_str("\nFILES NOT PROCESSED:\n");
            for failed in &report.failed {
                text.push_str(&format!("* {}: {}\n", failed.file, failed.error));
            }
        }

        text.push_str(
            "\nNOTE: Only students with ALL THREE required documents have combined packets.\n",
        );
        text.push_str("Please ensure all required paperwork is included and reprocess.\n");
        text
    }

    fn format_packet(packet: &StudentPacket) -> String {
        let mut text = String::new();
        if let Some(date) = &packet.rfep_date {
            text.push_str(&format!("RFEP date: {date}\n\n"));
        }
        for page in &packet.pages {
            text.push_str(&format!(
                "=== {} | {} page {} | {} ({}) ===\n\n",
                page.document_type.title(),
                page.file_name,
                page.page_index + 1,
                page.role.label(),
                page.language
            ));
            text.push_str(page.text.trim_end());
            text.push_str("\n\n");
        }
        text
    }
}

impl Exporter for TextExporter {
    fn export(&self, outcome: &BatchOutcome) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let report = Self::format_report(&outcome.report());
        fs::write(self.out_dir.join(REPORT_FILE_NAME), report)?;

        // One text file per packet, named like the combined PDF
        let packet_dir = self.out_dir.join("packets");
        fs::create_dir_all(&packet_dir)?;
        let packets = &outcome.assembly.packets;
        for (packet, stem) in packets.iter().zip(packet_file_stems(packets)) {
            fs::write(
                packet_dir.join(format!("{stem}.txt")),
                Self::format_packet(packet),
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::config::RuleSet;
    use crate::core::model::{DocumentType, IncompletePacket};
    use crate::parser::ExtractedFile;
    use crate::pipeline::Pipeline;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    fn complete_file(name: &str, marker: &str) -> ExtractedFile {
        ExtractedFile::new(
            name,
            vec![
                format!("Notification of English Language Program Exit\nStudent: Ana Lopez Student ID#: 12345\n{marker}"),
                "Reclassification Meeting w/ Parent/Guardian\nStudent ID: 12345".to_string(),
                "Teacher Evaluation for Reclassification\nStudent ID: 12345".to_string(),
            ],
        )
    }

    #[test]
    fn report_lists_missing_documents() {
        let report = BatchReport {
            incomplete: vec![IncompletePacket {
                student_id: "67890".to_string(),
                student_name: "Ana Lopez".to_string(),
                file_names: vec!["scan.pdf".to_string()],
                found: vec![DocumentType::NotificationOfExit],
                missing: vec![
                    DocumentType::ReclassificationMeeting,
                    DocumentType::TeacherRecommendation,
                ],
                total_pages: 2,
            }],
            ..BatchReport::default()
        };
        let text = TextExporter::format_report(&report);
        assert!(text.contains("1. STUDENT ID: 67890"));
        assert!(text.contains("[ ] Reclassification Meeting"));
        assert!(text.contains(&format!(
            "* {}: 0 student(s) missing",
            DocumentType::NotificationOfExit.title()
        )));
        assert!(text.contains("Total Pages Found: 2"));
    }

    #[test]
    fn empty_report_says_so() {
        let text = TextExporter::format_report(&BatchReport::default());
        assert!(text.contains("All students have complete paperwork."));
        assert!(!text.contains("FILES NOT PROCESSED"));
    }

    #[test]
    fn same_student_in_two_files_keeps_both_packets() -> anyhow::Result<()> {
        let output = temp_output_dir("packetizer-text-export");
        let pipeline = Pipeline::new(&RuleSet::default())?;
        let outcome = pipeline.process_batch(
            &[complete_file("first.pdf", "AAA"), complete_file("second.pdf", "BBB")],
            false,
        );
        assert_eq!(outcome.assembly.packets.len(), 2);

        TextExporter::new(output.clone()).export(&outcome)?;

        let first = fs::read_to_string(output.join("packets/12345_Ana_Lopez.txt"))?;
        let second = fs::read_to_string(output.join("packets/12345_Ana_Lopez_second.txt"))?;
        assert!(first.contains("AAA"));
        assert!(second.contains("BBB"));
        assert_eq!(fs::read_dir(output.join("packets"))?.count(), 2);

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
