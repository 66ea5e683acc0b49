use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{PacketError, Result};

/// Output of the text extractor for one scanned file: page texts in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFile {
    pub file_name: String,
    pub pages: Vec<String>,
}

impl ExtractedFile {
    pub fn new(file_name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            file_name: file_name.into(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone)]
pub struct PageSource {
    path: PathBuf,
}

impl PageSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `.json` holds an [`ExtractedFile`]; `.txt` is `pdftotext` output with
    /// pages separated by form feeds.
    pub fn load(&self) -> Result<ExtractedFile> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => {
                let data = fs::read_to_string(&self.path)?;
                let mut file: ExtractedFile = serde_json::from_str(&data)?;
                if file.file_name.trim().is_empty() {
                    file.file_name = self.display_name();
                }
                Ok(file)
            }
            Some("txt") => {
                let data = fs::read_to_string(&self.path)?;
                Ok(ExtractedFile::new(self.display_name(), split_form_feeds(&data)))
            }
            _ => Err(PacketError::UnsupportedSource(self.path.display().to_string())),
        }
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn split_form_feeds(data: &str) -> Vec<String> {
    let mut pages: Vec<String> = data.split('\x0c').map(str::to_string).collect();
    // pdftotext terminates the last page with a form feed too
    if pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    if pages.len() == 1 && pages[0].is_empty() {
        pages.clear();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_pdftotext_output() {
        let pages = split_form_feeds("page one\n\x0cpage two\n\x0c");
        assert_eq!(pages, vec!["page one\n".to_string(), "page two\n".to_string()]);
    }

    #[test]
    fn empty_text_has_no_pages() {
        assert!(split_form_feeds("").is_empty());
    }

    #[test]
    fn rejects_unknown_extension() {
        let source = PageSource::new(PathBuf::from("scan.pdf"));
        assert!(matches!(source.load(), Err(PacketError::UnsupportedSource(_))));
    }
}
