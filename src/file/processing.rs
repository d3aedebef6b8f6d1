use anyhow::Result;
use lopdf::Document;
use std::path::Path;
use tracing::warn;

use crate::file::FileFormat;

pub struct FileProcessor;

impl FileProcessor {
    /// Returns the plain text of a stored resource, chosen by file extension.
    /// Unreadable files and formats without a text path yield an empty string.
    pub fn extract_text<P: AsRef<Path>>(file_path: P) -> String {
        let file_path = file_path.as_ref();
        match FileFormat::from_path(file_path) {
            Some(FileFormat::Txt) => Self::read_plain_text(file_path).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), "Error reading text file: {:#}", e);
                String::new()
            }),
            Some(FileFormat::Pdf) => Self::extract_pdf_text(file_path).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), "Error extracting text from PDF: {:#}", e);
                String::new()
            }),
            _ => String::new(),
        }
    }

    fn read_plain_text(file_path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(file_path)?)
    }

    /// Page texts in page order, joined with no separator.
    pub fn extract_pdf_text(file_path: &Path) -> Result<String> {
        let document = Document::load(file_path)?;
        let mut text = String::new();
        for page_number in document.get_pages().keys() {
            text.push_str(&document.extract_text(&[*page_number])?);
        }
        Ok(text)
    }
}
