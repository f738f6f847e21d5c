use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

/// Reduces a document to its raw text.
pub trait TextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut text = String::new();
        for page_no in document.get_pages().keys() {
            let page_text = document
                .extract_text(&[*page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;
            text.push_str(&page_text);
            text.push('\n');
        }

        Ok(text)
    }
}
