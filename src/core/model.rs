use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three forms every reclassification packet must contain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    NotificationOfExit,
    ReclassificationMeeting,
    TeacherRecommendation,
}

/// Order in which documents appear in every assembled packet, whatever order
/// the scanner saw them in.
pub const CANONICAL_ORDER: [DocumentType; 3] = [
    DocumentType::NotificationOfExit,
    DocumentType::ReclassificationMeeting,
    DocumentType::TeacherRecommendation,
];

impl DocumentType {
    pub fn title(self) -> &'static str {
        match self {
            DocumentType::NotificationOfExit => "Notification of English Language Program Exit",
            DocumentType::ReclassificationMeeting => "Reclassification Meeting",
            DocumentType::TeacherRecommendation => "Teacher Recommendation Form",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Chinese,
    Spanish,
    Unknown,
}

impl Language {
    /// Chinese and Spanish pages are translations of the English forms.
    pub fn is_foreign(self) -> bool {
        matches!(self, Language::Chinese | Language::Spanish)
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
            Language::Spanish => "es",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of classifying a single page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PageClass {
    NotificationOfExit,
    ReclassificationMeeting,
    TeacherRecommendation,
    Unclassified,
}

impl PageClass {
    pub fn document_type(self) -> Option<DocumentType> {
        match self {
            PageClass::NotificationOfExit => Some(DocumentType::NotificationOfExit),
            PageClass::ReclassificationMeeting => Some(DocumentType::ReclassificationMeeting),
            PageClass::TeacherRecommendation => Some(DocumentType::TeacherRecommendation),
            PageClass::Unclassified => None,
        }
    }
}

impl From<DocumentType> for PageClass {
    fn from(doc: DocumentType) -> Self {
        match doc {
            DocumentType::NotificationOfExit => PageClass::NotificationOfExit,
            DocumentType::ReclassificationMeeting => PageClass::ReclassificationMeeting,
            DocumentType::TeacherRecommendation => PageClass::TeacherRecommendation,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub class: PageClass,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentIdentity {
    pub id: String,
    pub name: Option<String>,
}

/// One page of an input file after normalization, classification and
/// identification. Never changes once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub raw_text: String,
    pub text: String,
    pub language: Language,
    pub class: PageClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<StudentIdentity>,
    /// Candidate flags set before the scan. No student id: the page can
    /// only extend an existing segment.
    pub continuation: bool,
    /// No student id and foreign-language content. A foreign page that
    /// carries its own id is not flagged here but can still be placed as a
    /// translation; `SegmentPage::role` holds the final placement.
    pub translation: bool,
}

impl Page {
    pub fn new(
        index: usize,
        raw_text: String,
        text: String,
        classification: Classification,
        identity: Option<StudentIdentity>,
    ) -> Self {
        let continuation = identity.is_none();
        let translation = continuation && classification.language.is_foreign();
        Self {
            index,
            raw_text,
            text,
            language: classification.language,
            class: classification.class,
            identity,
            continuation,
            translation,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.id.as_str())
    }

    pub fn student_name(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|identity| identity.name.as_deref())
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.class.document_type()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum PageRole {
    Primary,
    Continuation,
    /// Linked to the primary-language page it follows in the packet.
    Translation { linked_to: usize },
}

impl PageRole {
    pub fn is_translation(self) -> bool {
        matches!(self, PageRole::Translation { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            PageRole::Primary => "primary",
            PageRole::Continuation => "continuation",
            PageRole::Translation { .. } => "translation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPage {
    pub page_index: usize,
    pub role: PageRole,
    pub language: Language,
    pub confidence: f32,
    pub text: String,
}

/// Contiguous run of pages belonging to one (student, document type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub file_name: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub document_type: DocumentType,
    pub pages: Vec<SegmentPage>,
}

impl Segment {
    pub fn primary(&self) -> &SegmentPage {
        &self.pages[0]
    }

    pub fn page_indices(&self) -> Vec<usize> {
        self.pages.iter().map(|page| page.page_index).collect()
    }

    pub fn translations(&self) -> impl Iterator<Item = &SegmentPage> {
        self.pages.iter().filter(|page| page.role.is_translation())
    }

    /// Primary-language pages in scan order, each followed by the
    /// translation pages linked to it.
    pub fn ordered_pages(&self) -> Vec<&SegmentPage> {
        let mut ordered = Vec::with_capacity(self.pages.len());
        for page in self.pages.iter().filter(|page| !page.role.is_translation()) {
            ordered.push(page);
            ordered.extend(self.pages.iter().filter(|candidate| {
                matches!(candidate.role, PageRole::Translation { linked_to } if linked_to == page.page_index)
            }));
        }
        ordered
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketPage {
    pub file_name: String,
    pub page_index: usize,
    pub document_type: DocumentType,
    pub role: PageRole,
    pub language: Language,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentPacket {
    pub student_id: String,
    pub student_name: String,
    pub documents: BTreeMap<DocumentType, Segment>,
    pub complete: bool,
    /// Reclassification date read from the first packet page.
    pub rfep_date: Option<String>,
    pub pages: Vec<PacketPage>,
}

impl StudentPacket {
    /// `{id}_{Name_With_Underscores}.pdf`, safe on every filesystem.
    pub fn output_file_name(&self) -> String {
        let name = self
            .student_name
            .split_whitespace()
            .map(|part| {
                part.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        if name.is_empty() {
            format!("{}.pdf", self.student_id)
        } else {
            format!("{}_{}.pdf", self.student_id, name)
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnclassifiedPage {
    pub file_name: String,
    pub page_index: usize,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentRef {
    pub student_id: String,
    pub document_type: DocumentType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbiguousBoundary {
    pub file_name: String,
    pub page_index: usize,
    pub class: PageClass,
    pub language: Language,
    /// Best-guess segment the page was attached to.
    pub assigned_to: SegmentRef,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncompletePacket {
    pub student_id: String,
    pub student_name: String,
    pub file_names: Vec<String>,
    pub found: Vec<DocumentType>,
    pub missing: Vec<DocumentType>,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateSegment {
    pub student_id: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub pages: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_page(page_index: usize, role: PageRole) -> SegmentPage {
        SegmentPage {
            page_index,
            role,
            language: if role.is_translation() {
                Language::Spanish
            } else {
                Language::English
            },
            confidence: 1.0,
            text: String::new(),
        }
    }

    #[test]
    fn translations_follow_their_linked_page() {
        let segment = Segment {
            file_name: "scan.pdf".to_string(),
            student_id: "12345".to_string(),
            student_name: None,
            document_type: DocumentType::NotificationOfExit,
            pages: vec![
                segment_page(0, PageRole::Primary),
                segment_page(1, PageRole::Continuation),
                segment_page(2, PageRole::Translation { linked_to: 0 }),
                segment_page(3, PageRole::Translation { linked_to: 1 }),
            ],
        };

        let order: Vec<_> = segment
            .ordered_pages()
            .iter()
            .map(|page| page.page_index)
            .collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
        assert_eq!(segment.translations().count(), 2);
    }

    #[test]
    fn output_file_name_is_sanitized() {
        let packet = StudentPacket {
            student_id: "106874".to_string(),
            student_name: "Borui  Hu/Jr.".to_string(),
            documents: BTreeMap::new(),
            complete: true,
            rfep_date: None,
            pages: vec![],
        };
        assert_eq!(packet.output_file_name(), "106874_Borui_HuJr.pdf");
    }

    #[test]
    fn translation_flag_requires_missing_id() {
        let classification = Classification {
            class: PageClass::NotificationOfExit,
            language: Language::Chinese,
        };
        let identity = StudentIdentity {
            id: "12345".to_string(),
            name: None,
        };
        let with_id = Page::new(0, String::new(), String::new(), classification, Some(identity));
        let without_id = Page::new(1, String::new(), String::new(), classification, None);
        assert!(!with_id.translation);
        assert!(without_id.translation);
        assert!(without_id.continuation);
    }
}
