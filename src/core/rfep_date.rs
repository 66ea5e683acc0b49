use once_cell::sync::Lazy;
use regex::Regex;

/// The date is printed in the form header; only fall back to the rest of
/// the page when the first characters have none.
const HEADER_CHARS: usize = 500;

// Tried in order: every slash date beats any dash date.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{1,2}/\d{1,2}/\d{4}",
        r"\d{1,2}-\d{1,2}-\d{4}",
        r"\d{1,2}\.\d{1,2}\.\d{4}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("date pattern must compile"))
    .collect()
});

/// Reclassification date on the first page of a packet, as written.
pub fn extract_rfep_date(text: &str) -> Option<String> {
    let header_end = text
        .char_indices()
        .nth(HEADER_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    find_date(&text[..header_end]).or_else(|| find_date(text))
}

fn find_date(text: &str) -> Option<String> {
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text))
        .map(|found| found.as_str().to_string())
}
