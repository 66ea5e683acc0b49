//! Multilingual pattern tables.
//!
//! Every phrase and pattern the classifier and identifier use lives here as
//! data. `RuleSet::default()` carries the district forms; a JSON file with the
//! same shape replaces them without touching the scanning code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::model::{DocumentType, Language};
use crate::error::Result;

/// A form title that identifies a document type in one language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerRule {
    pub language: Language,
    pub document_type: DocumentType,
    pub phrase: String,
}

/// A regex whose first capture group is the student id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdPattern {
    pub language: Language,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    /// Evaluated top to bottom; the first match classifies the page.
    pub triggers: Vec<TriggerRule>,
    pub id_patterns: Vec<IdPattern>,
    /// Regexes whose first capture group is the student name.
    pub name_patterns: Vec<String>,
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_fuzzy_threshold() -> f64 {
    0.9
}

// Foreign titles come first: translated pages often repeat the English form
// title in their header.
const TRIGGERS: &[(Language, DocumentType, &str)] = &[
    (Language::Chinese, DocumentType::TeacherRecommendation, "重新分类教师评估"),
    (Language::Chinese, DocumentType::ReclassificationMeeting, "重新分类会议"),
    (Language::Chinese, DocumentType::NotificationOfExit, "退出英语教学计划的通知"),
    (
        Language::Spanish,
        DocumentType::TeacherRecommendation,
        "Evaluación del maestro para la reclasificación",
    ),
    (
        Language::Spanish,
        DocumentType::ReclassificationMeeting,
        "Reunión de reclasificación",
    ),
    (
        Language::Spanish,
        DocumentType::NotificationOfExit,
        "Notificación de salida del programa de idioma inglés",
    ),
    (
        Language::English,
        DocumentType::TeacherRecommendation,
        "Teacher Evaluation for Reclassification",
    ),
    (
        Language::English,
        DocumentType::TeacherRecommendation,
        "Criteria 2: Teacher Evaluation",
    ),
    (
        Language::English,
        DocumentType::ReclassificationMeeting,
        "Reclassification Meeting w/ Parent/Guardian",
    ),
    (
        Language::English,
        DocumentType::ReclassificationMeeting,
        "Alternate Reclassification IEP Meeting",
    ),
    (
        Language::English,
        DocumentType::NotificationOfExit,
        "Notification of English Language Program Exit",
    ),
];

const ID_PATTERNS: &[(Language, &str)] = &[
    (Language::English, r"(?i)Student ID#:\s*(\d{5,6})(?:\D|$)"),
    (Language::English, r"(?i)Student ID[#:\s]*(\d{5,6})(?:\D|$)"),
    (Language::English, r"(?i)\bID[#:\s]*(\d{5,6})(?:\D|$)"),
    (Language::Chinese, r"学号[#:\s]*(\d{5,6})(?:\D|$)"),
    (Language::Chinese, r"学生编号[#:\s]*(\d{5,6})(?:\D|$)"),
    (
        Language::Spanish,
        r"(?i)N[°o]\.?\s*de\s*identificaci[oó]n\s*del\s*estudiante[#:\s]*(\d{5,6})(?:\D|$)",
    ),
    (Language::Spanish, r"(?i)ID\s*del\s*estudiante[#:\s]*(\d{5,6})(?:\D|$)"),
    (Language::Unknown, r"(?i)(?:\bID\b|编号|学号)[^\d\n]{0,40}?(\d{5,6})(?:\D|$)"),
];

const NAME_PATTERNS: &[&str] = &[
    r"(?im)Student[ \t]*:[ \t]*(\p{L}[\p{L} .'-]*?)(?:[ \t]+Student ID|[ \t]*$)",
    r"(?im)(?:Student Name|Name)[ \t]*:[ \t]*(\p{L}[\p{L} .'-]*?)(?:[ \t]+(?:Student|Grade|ID)|[ \t]*$)",
    r"(?m)学生[ \t]*:[ \t]*(\p{L}[\p{L} .'-]*?)(?:[ \t]*学号|[ \t]+等级|[ \t]*$)",
    r"(?m)姓名[ \t]*:[ \t]*(\p{L}[\p{L} .'-]*?)(?:[ \t]*学号|[ \t]+等级|[ \t]*$)",
    r"(?im)(?:Nombre|Estudiante)[ \t]*:[ \t]*(\p{L}[\p{L} .'-]*?)(?:[ \t]+(?:Grado|N°|ID)|[ \t]*$)",
    r"(?i)(\p{L}[\p{L} .'-]{2,29}?)[ \t]+(?:Student[ \t]*)?ID[#: \t]*\d{5,6}",
];

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            triggers: TRIGGERS
                .iter()
                .map(|&(language, document_type, phrase)| TriggerRule {
                    language,
                    document_type,
                    phrase: phrase.to_string(),
                })
                .collect(),
            id_patterns: ID_PATTERNS
                .iter()
                .map(|&(language, pattern)| IdPattern {
                    language,
                    pattern: pattern.to_string(),
                })
                .collect(),
            name_patterns: NAME_PATTERNS.iter().map(|p| p.to_string()).collect(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

impl RuleSet {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
