/// Extraction artifact repair
/// Reassembles ligatures, mis-decoded UTF-8 and split CJK runs before any
/// pattern matching sees the page text.
use unicode_normalization::UnicodeNormalization;

// UTF-8 bytes read back as Windows-1252, longest sequences first.
const MOJIBAKE_MAP: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "–"),
    ("â€”", "—"),
    ("â€¦", "…"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{ad}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã¼", "ü"),
    ("Ã‰", "É"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
    ("Ã‘", "Ñ"),
    ("Â¿", "¿"),
    ("Â¡", "¡"),
    ("Â°", "°"),
    ("Âº", "º"),
];

// Typographic ligatures emitted by some PDF producers
const LIGATURE_MAP: &[(&str, &str)] = &[
    ("ﬃ", "ffi"),
    ("ﬄ", "ffl"),
    ("ﬀ", "ff"),
    ("ﬁ", "fi"),
    ("ﬂ", "fl"),
    ("ﬅ", "st"),
    ("ﬆ", "st"),
];

const INVISIBLE: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
    '\u{00AD}', // soft hyphen
];

pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF | // CJK Unified Ideographs Extension A
        0x4E00..=0x9FFF | // CJK Unified Ideographs
        0xF900..=0xFAFF | // CJK Compatibility Ideographs
        0x20000..=0x2A6DF // CJK Unified Ideographs Extension B
    )
}

fn replace_all(text: &str, table: &[(&str, &str)]) -> String {
    table
        .iter()
        .fold(text.to_string(), |acc, (from, to)| {
            if acc.contains(from) {
                acc.replace(from, to)
            } else {
                acc
            }
        })
}

fn remove_intra_cjk_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if c == ' ' || c == '\t' {
            pending.push(c);
            continue;
        }
        if !pending.is_empty() {
            let between_ideographs =
                prev.map(is_cjk_ideograph).unwrap_or(false) && is_cjk_ideograph(c);
            if !between_ideographs {
                result.push_str(&pending);
            }
            pending.clear();
        }
        result.push(c);
        prev = Some(c);
    }
    result.push_str(&pending);

    result
}

/// Repair extraction artifacts in one page of text
///
/// Example: "Identiﬁcación del estudiante" -> "Identificación del estudiante"
pub fn normalize_text(text: &str) -> String {
    // 1) unify line endings
    // 2) known artifact tables, before NFKC can split the mojibake pairs
    // 3) NFKC: fullwidth punctuation, composed accents, nbsp -> space
    // 4) drop invisible characters, then rejoin ideographs split by spaces
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let repaired = replace_all(&replace_all(&unified, MOJIBAKE_MAP), LIGATURE_MAP);
    let compat = repaired.nfkc().collect::<String>();
    let visible = compat
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .collect::<String>();
    remove_intra_cjk_whitespace(&visible)
}
