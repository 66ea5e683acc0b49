use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use packetizer::core::model::{DocumentType, Language, PageRole};
use packetizer::export::{Exporter, JsonExporter, TextExporter};
use packetizer::pipeline::{build_batch, PipelineConfig};
use packetizer::{ExtractedFile, PacketError, PageSource, Pipeline, RuleSet, CANONICAL_ORDER};

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

fn pipeline() -> Pipeline {
    Pipeline::new(&RuleSet::default()).unwrap()
}

/// Two students scanned back to back: 12345 complete with a continuation
/// page, 67890 with only the exit notice and its Spanish translation.
fn scenario() -> ExtractedFile {
    ExtractedFile::new(
        "batch_0412.pdf",
        vec![
            "Notification of English Language Program Exit\nStudent: Borui Hu Student ID#: 12345\nGrade: 4\nDate of reclassification: 05/14/2024".to_string(),
            "Reclassification Meeting w/ Parent/Guardian\nStudent Name: Borui Hu\nStudent ID: 12345\nMeeting date: 04/12".to_string(),
            "Meeting notes continued.\nParent signature: ________\nDate: 04/12".to_string(),
            "Teacher Evaluation for Reclassification\nStudent ID: 12345\nReading: meets grade level".to_string(),
            "Notification of English Language Program Exit\nStudent: Ana Lopez Student ID#: 67890\nGrade: 5".to_string(),
            "Notificación de salida del programa de idioma inglés\nEstimado padre o tutor: su hijo cumplió los criterios.".to_string(),
        ],
    )
}

/// Unit test: the two-student scan yields one packet and one incomplete entry
#[test]
fn test_scenario_packets_and_report() -> Result<()> {
    let pipeline = pipeline();
    let outcome = pipeline.process_file(&scenario())?;
    let assembly = pipeline.assemble(&outcome.resolution.segments);

    assert_eq!(assembly.packets.len(), 1);
    let packet = &assembly.packets[0];
    assert_eq!(packet.student_id, "12345");
    assert_eq!(packet.student_name, "Borui Hu");
    let order: Vec<_> = packet.pages.iter().map(|page| page.page_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert_eq!(packet.pages[2].role, PageRole::Continuation);
    assert_eq!(packet.output_file_name(), "12345_Borui_Hu.pdf");
    assert_eq!(packet.rfep_date.as_deref(), Some("05/14/2024"));

    assert_eq!(assembly.incomplete.len(), 1);
    let entry = &assembly.incomplete[0];
    assert_eq!(entry.student_id, "67890");
    assert_eq!(entry.found, vec![DocumentType::NotificationOfExit]);
    assert_eq!(
        entry.missing,
        vec![
            DocumentType::ReclassificationMeeting,
            DocumentType::TeacherRecommendation
        ]
    );
    assert_eq!(entry.total_pages, 2);

    // The Spanish page is a translation, not a review item
    let (segment, placed) = outcome.resolution.placement(5).unwrap();
    assert_eq!(segment.student_id, "67890");
    assert_eq!(placed.role, PageRole::Translation { linked_to: 4 });
    assert_eq!(placed.language, Language::Spanish);
    assert!(outcome.resolution.unclassified.is_empty());
    assert!(outcome.resolution.ambiguous.is_empty());
    Ok(())
}

/// Unit test: same input, same segments and packets
#[test]
fn test_idempotent() -> Result<()> {
    let pipeline = pipeline();
    let first = pipeline.process_batch(&[scenario()], false);
    let second = pipeline.process_batch(&[scenario()], false);
    assert_eq!(
        serde_json::to_string(&first.assembly)?,
        serde_json::to_string(&second.assembly)?
    );
    assert_eq!(
        serde_json::to_string(&first.files[0].resolution)?,
        serde_json::to_string(&second.files[0].resolution)?
    );
    Ok(())
}

/// Unit test: packet order does not depend on scan order
#[test]
fn test_canonical_order_with_reversed_scan() -> Result<()> {
    let file = ExtractedFile::new(
        "reversed.pdf",
        vec![
            "Criteria 2: Teacher Evaluation\nStudent ID: 54321".to_string(),
            "Reclassification Meeting w/ Parent/Guardian\nStudent ID: 54321".to_string(),
            "重新分类会议\n家长签名".to_string(),
            "Notification of English Language Program Exit\nStudent ID: 54321".to_string(),
        ],
    );
    let pipeline = pipeline();
    let outcome = pipeline.process_file(&file)?;
    let assembly = pipeline.assemble(&outcome.resolution.segments);

    let packet = &assembly.packets[0];
    let documents: Vec<_> = packet.pages.iter().map(|page| page.document_type).collect();
    assert_eq!(
        documents,
        vec![
            CANONICAL_ORDER[0],
            CANONICAL_ORDER[1],
            CANONICAL_ORDER[1],
            CANONICAL_ORDER[2]
        ]
    );
    let order: Vec<_> = packet.pages.iter().map(|page| page.page_index).collect();
    assert_eq!(order, vec![3, 1, 2, 0]);
    assert_eq!(packet.pages[2].language, Language::Chinese);
    Ok(())
}

/// Unit test: an empty extraction is corrupt, others in the batch survive
#[test]
fn test_corrupt_input_is_isolated() {
    let pipeline = pipeline();
    let err = pipeline
        .process_file(&ExtractedFile::new("empty.pdf", vec![]))
        .unwrap_err();
    assert!(matches!(err, PacketError::CorruptInput { .. }));

    let outcome = pipeline.process_batch(
        &[ExtractedFile::new("empty.pdf", vec![]), scenario()],
        false,
    );
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.assembly.packets.len(), 1);
}

/// Integration test: pdftotext output through the full batch and exporters
#[test]
fn test_text_source_to_exports() -> Result<()> {
    let dir = temp_output_dir("packetizer-integration");
    fs::create_dir_all(&dir)?;

    let input = dir.join("scan.txt");
    fs::write(&input, format!("{}\x0c", scenario().pages.join("\x0c")))?;
    let loaded = PageSource::new(input.clone()).load()?;
    assert_eq!(loaded.file_name, "scan.txt");
    assert_eq!(loaded.page_count(), 6);

    let missing = dir.join("missing.json");
    let output = dir.join("out");
    let config = PipelineConfig::new(vec![input, missing], output.clone());
    let outcome = build_batch(&config)?;
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.assembly.packets.len(), 1);

    JsonExporter::new(output.clone()).export(&outcome)?;
    TextExporter::new(output.clone()).export(&outcome)?;

    let packets: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("packets.json"))?)?;
    assert_eq!(packets[0]["student_id"], "12345");
    assert_eq!(packets[0]["rfep_date"], "05/14/2024");

    let report = fs::read_to_string(output.join("INCOMPLETE_PAPERWORK_REPORT.txt"))?;
    assert!(report.contains("STUDENT ID: 67890"));
    assert!(report.contains("missing.json"));
    assert!(output.join("packets/12345_Borui_Hu.txt").exists());

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

/// Integration test: a JSON rule file replaces the built-in triggers
#[test]
fn test_rules_override() -> Result<()> {
    let dir = temp_output_dir("packetizer-rules");
    fs::create_dir_all(&dir)?;

    let mut rules = RuleSet::default();
    rules
        .triggers
        .retain(|rule| rule.document_type != DocumentType::TeacherRecommendation);
    let path = dir.join("rules.json");
    fs::write(&path, rules.to_json()?)?;

    let loaded = RuleSet::from_json_file(&path)?;
    let pipeline = Pipeline::new(&loaded)?;
    let outcome = pipeline.process_file(&scenario())?;
    let assembly = pipeline.assemble(&outcome.resolution.segments);
    assert!(assembly.packets.is_empty());
    assert_eq!(assembly.incomplete.len(), 2);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
