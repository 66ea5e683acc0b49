use regex::Regex;
use tracing::trace;

use crate::config::RuleSet;
use crate::core::model::{Language, StudentIdentity};
use crate::error::{PacketError, Result};

#[derive(Debug, Clone)]
struct IdRule {
    language: Language,
    matcher: Regex,
}

#[derive(Debug, Clone)]
pub struct StudentIdentifier {
    id_rules: Vec<IdRule>,
    name_rules: Vec<Regex>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| PacketError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_with_group(pattern: &str) -> Result<Regex> {
    let regex = compile(pattern)?;
    if regex.captures_len() < 2 {
        return Err(PacketError::MissingCaptureGroup {
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

impl StudentIdentifier {
    pub fn from_rules(rules: &RuleSet) -> Result<Self> {
        let id_rules = rules
            .id_patterns
            .iter()
            .map(|id| {
                Ok(IdRule {
                    language: id.language,
                    matcher: compile_with_group(&id.pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let name_rules = rules
            .name_patterns
            .iter()
            .map(|pattern| compile_with_group(pattern))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id_rules,
            name_rules,
        })
    }

    /// First id pattern that matches wins. The name is only looked for next
    /// to that id so it cannot come from another student's block.
    pub fn identify(&self, text: &str) -> Option<StudentIdentity> {
        let (id, start, end) = self.id_rules.iter().find_map(|rule| {
            let found = rule.matcher.captures(text)?.get(1)?;
            trace!(language = %rule.language, id = found.as_str(), "student id pattern matched");
            Some((found.as_str().to_string(), found.start(), found.end()))
        })?;

        let window = adjacent_lines(text, start, end);
        let name = self.name_rules.iter().find_map(|rule| {
            let found = rule.captures(window)?.get(1)?;
            clean_name(found.as_str())
        });

        Some(StudentIdentity { id, name })
    }
}

/// The line holding `start..end` plus one line on either side.
fn adjacent_lines(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let window_start = if line_start == 0 {
        0
    } else {
        text[..line_start - 1]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    };

    let line_end = text[end..].find('\n').map(|i| end + i).unwrap_or(text.len());
    let window_end = if line_end >= text.len() {
        text.len()
    } else {
        text[line_end + 1..]
            .find('\n')
            .map(|i| line_end + 1 + i)
            .unwrap_or(text.len())
    };

    &text[window_start..window_end]
}

// Form labels the looser patterns can pick up instead of a name.
const LABEL_WORDS: &[&str] = &[
    "student", "name", "grade", "id", "school", "estudiante", "nombre", "grado",
];

fn clean_name(raw: &str) -> Option<String> {
    let name = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '.' || c == '-' || c == '\'')
        .to_string();
    let only_labels = name
        .split(' ')
        .all(|word| LABEL_WORDS.contains(&word.to_lowercase().as_str()));
    (name.chars().count() > 2 && !only_labels).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> StudentIdentifier {
        StudentIdentifier::from_rules(&RuleSet::default()).unwrap()
    }

    #[test]
    fn notification_header() {
        let identity = identifier()
            .identify("Notification of English Language Program Exit\nStudent: Borui Hu Student ID#: 106874\nGrade: 5")
            .unwrap();
        assert_eq!(identity.id, "106874");
        assert_eq!(identity.name.as_deref(), Some("Borui Hu"));
    }

    #[test]
    fn five_digit_id_with_name_label() {
        let identity = identifier()
            .identify("Student Name: Ana Lopez\nStudent ID: 67890\nSchool: Lincoln")
            .unwrap();
        assert_eq!(identity.id, "67890");
        assert_eq!(identity.name.as_deref(), Some("Ana Lopez"));
    }

    #[test]
    fn chinese_and_spanish_ids() {
        let identity = identifier().identify("学生: 胡博睿 学号: 106874").unwrap();
        assert_eq!(identity.id, "106874");
        assert_eq!(identity.name.as_deref(), Some("胡博睿"));

        let identity = identifier()
            .identify("Nombre: María López\nN° de identificación del estudiante: 54321")
            .unwrap();
        assert_eq!(identity.id, "54321");
        assert_eq!(identity.name.as_deref(), Some("María López"));
    }

    #[test]
    fn name_preceding_id_label() {
        let identity = identifier().identify("Borui Hu Student ID 12345").unwrap();
        assert_eq!(identity.name.as_deref(), Some("Borui Hu"));
    }

    #[test]
    fn longer_numbers_are_not_ids() {
        assert!(identifier().identify("Student ID: 1234567").is_none());
        assert!(identifier().identify("Phone 5551234").is_none());
    }

    #[test]
    fn no_id_means_no_name() {
        assert!(identifier().identify("Student: Borui Hu\nGrade 5").is_none());
    }

    #[test]
    fn name_is_only_taken_next_to_the_id() {
        let text = "Student: Someone Else\n\n\n\nStudent ID: 12345";
        let identity = identifier().identify(text).unwrap();
        assert_eq!(identity.id, "12345");
        assert_eq!(identity.name, None);
    }

    #[test]
    fn rejects_pattern_without_group() {
        let mut rules = RuleSet::default();
        rules.id_patterns[0].pattern = r"Student ID \d+".to_string();
        assert!(matches!(
            StudentIdentifier::from_rules(&rules),
            Err(PacketError::MissingCaptureGroup { .. })
        ));
    }
}
