use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::core::model::{
    DocumentType, DuplicateSegment, IncompletePacket, PacketPage, Segment, StudentPacket,
    CANONICAL_ORDER,
};
use crate::core::rfep_date::extract_rfep_date;
use crate::segment::Assembly;

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Default, Clone)]
pub struct PacketAssembler;

impl PacketAssembler {
    pub fn new() -> Self {
        Self
    }

    /// One packet per student holding every required form, in canonical
    /// order. Students missing a form get an incomplete entry instead.
    pub fn assemble(&self, segments: &[Segment]) -> Assembly {
        let mut assembly = Assembly::default();

        for (student_id, group) in group_by_student(segments) {
            let mut documents: BTreeMap<DocumentType, &Segment> = BTreeMap::new();
            for segment in &group {
                if documents.contains_key(&segment.document_type) {
                    warn!(
                        student = student_id,
                        document = %segment.document_type,
                        file = %segment.file_name,
                        "duplicate form, keeping the first one"
                    );
                    assembly.duplicates.push(DuplicateSegment {
                        student_id: student_id.to_string(),
                        document_type: segment.document_type,
                        file_name: segment.file_name.clone(),
                        pages: segment.page_indices(),
                    });
                } else {
                    documents.insert(segment.document_type, segment);
                }
            }

            let student_name = student_name(&documents, &group);
            let missing = CANONICAL_ORDER
                .iter()
                .copied()
                .filter(|doc| !documents.contains_key(doc))
                .collect::<Vec<_>>();

            if missing.is_empty() {
                let packet = build_packet(student_id, student_name, &documents);
                info!(
                    student = student_id,
                    pages = packet.page_count(),
                    "packet complete"
                );
                assembly.packets.push(packet);
            } else {
                warn!(
                    student = student_id,
                    missing = ?missing,
                    "incomplete paperwork"
                );
                let mut file_names: Vec<String> = Vec::new();
                for segment in &group {
                    if !file_names.contains(&segment.file_name) {
                        file_names.push(segment.file_name.clone());
                    }
                }
                assembly.incomplete.push(IncompletePacket {
                    student_id: student_id.to_string(),
                    student_name,
                    file_names,
                    found: CANONICAL_ORDER
                        .iter()
                        .copied()
                        .filter(|doc| documents.contains_key(doc))
                        .collect(),
                    missing,
                    total_pages: group.iter().map(|segment| segment.pages.len()).sum(),
                });
            }
        }

        assembly
    }
}

/// Students in order of first appearance.
fn group_by_student(segments: &[Segment]) -> Vec<(&str, Vec<&Segment>)> {
    let mut groups: Vec<(&str, Vec<&Segment>)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for segment in segments {
        let student_id = segment.student_id.as_str();
        let slot = *slots.entry(student_id).or_insert_with(|| {
            groups.push((student_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(segment);
    }
    groups
}

fn student_name(documents: &BTreeMap<DocumentType, &Segment>, group: &[&Segment]) -> String {
    CANONICAL_ORDER
        .iter()
        .filter_map(|doc| documents.get(doc).copied())
        .chain(group.iter().copied())
        .find_map(|segment| segment.student_name.clone())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

fn build_packet(
    student_id: &str,
    student_name: String,
    documents: &BTreeMap<DocumentType, &Segment>,
) -> StudentPacket {
    let pages: Vec<PacketPage> = CANONICAL_ORDER
        .iter()
        .filter_map(|doc| documents.get(doc).copied())
        .flat_map(|segment| {
            segment
                .ordered_pages()
                .into_iter()
                .map(move |page| PacketPage {
                    file_name: segment.file_name.clone(),
                    page_index: page.page_index,
                    document_type: segment.document_type,
                    role: page.role,
                    language: page.language,
                    text: page.text.clone(),
                })
        })
        .collect();
    let rfep_date = pages.first().and_then(|page| extract_rfep_date(&page.text));

    StudentPacket {
        student_id: student_id.to_string(),
        student_name,
        documents: documents
            .iter()
            .map(|(doc, segment)| (*doc, (*segment).clone()))
            .collect(),
        complete: true,
        rfep_date,
        pages,
    }
}
