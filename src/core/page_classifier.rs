use regex::Regex;
use strsim::normalized_levenshtein;

use crate::config::{RuleSet, TriggerRule};
use crate::core::model::{Classification, DocumentType, Language, PageClass};
use crate::error::{PacketError, Result};
use crate::parser::normalize::is_cjk_ideograph;

/// One compiled trigger: a form title in one language.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub language: Language,
    pub document_type: DocumentType,
    pub phrase: String,
    matcher: Regex,
}

impl ClassificationRule {
    pub fn new(language: Language, document_type: DocumentType, phrase: &str) -> Result<Self> {
        let pattern = phrase_pattern(phrase);
        let matcher = Regex::new(&pattern).map_err(|source| PacketError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Self {
            language,
            document_type,
            phrase: phrase.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    fn classification(&self) -> Classification {
        Classification {
            class: self.document_type.into(),
            language: self.language,
        }
    }
}

// Case-insensitive, and tolerant of titles wrapped across lines.
fn phrase_pattern(phrase: &str) -> String {
    let words = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!("(?i){words}")
}

#[derive(Debug, Clone)]
pub struct PageClassifier {
    rules: Vec<ClassificationRule>,
    fuzzy_threshold: f64,
}

impl PageClassifier {
    pub fn new(rules: Vec<ClassificationRule>, fuzzy_threshold: f64) -> Self {
        Self {
            rules,
            fuzzy_threshold,
        }
    }

    pub fn from_rules(rules: &RuleSet) -> Result<Self> {
        let compiled = rules
            .triggers
            .iter()
            .map(|TriggerRule { language, document_type, phrase }| {
                ClassificationRule::new(*language, *document_type, phrase)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(compiled, rules.fuzzy_threshold))
    }

    pub fn classify(&self, text: &str) -> Classification {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(text)) {
            return rule.classification();
        }
        if let Some(rule) = self.fuzzy_match(text) {
            return rule.classification();
        }
        Classification {
            class: PageClass::Unclassified,
            language: detect_language(text),
        }
    }

    /// Tolerates OCR damage in a title line. Rule order still decides ties.
    fn fuzzy_match(&self, text: &str) -> Option<&ClassificationRule> {
        let lines = text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();

        self.rules.iter().find(|rule| {
            let phrase = rule.phrase.to_lowercase();
            let phrase_len = phrase.chars().count();
            lines.iter().any(|line| {
                let line_len = line.chars().count();
                line_len.abs_diff(phrase_len) * 10 <= phrase_len
                    && normalized_levenshtein(line, &phrase) >= self.fuzzy_threshold
            })
        })
    }
}

const SPANISH_MARKERS: &[&str] = &[
    "el", "la", "los", "las", "del", "de", "que", "para", "su", "por", "con", "estudiante",
    "padre", "tutor", "programa", "idioma", "fecha", "escuela", "hijo", "firma",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "of", "to", "for", "your", "by", "with", "is", "student", "parent",
    "guardian", "program", "language", "date", "school", "child", "signature",
];

/// Language of a page no trigger phrase recognized.
pub fn detect_language(text: &str) -> Language {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let cjk = text.chars().filter(|c| is_cjk_ideograph(*c)).count();
    if cjk >= 4 && cjk * 3 >= letters {
        return Language::Chinese;
    }

    let lowered = text.to_lowercase();
    let words = lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();
    let accents = lowered
        .chars()
        .filter(|c| matches!(c, 'ñ' | '¿' | '¡' | 'á' | 'é' | 'í' | 'ó' | 'ú'))
        .count();
    let spanish = words.iter().filter(|w| SPANISH_MARKERS.contains(w)).count() + accents;
    let english = words.iter().filter(|w| ENGLISH_MARKERS.contains(w)).count();
    if spanish >= 3 && spanish > english {
        return Language::Spanish;
    }

    if text.chars().any(|c| c.is_ascii_alphabetic()) {
        Language::English
    } else {
        Language::Unknown
    }
}
