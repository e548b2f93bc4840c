//! PDF text extraction with per-page failure isolation.

use super::normalize::normalize_page_text;
use super::types::{ExtractedDocument, ExtractionError};
use lopdf::Document;
use std::fmt::Display;

/// Interface implemented by document-to-text converters.
pub trait TextExtractor: Send + Sync {
    /// Convert raw document bytes into page-ordered text.
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError>;
}

/// Extracts text from PDF documents using `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Construct a new PDF extractor.
    pub const fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let document =
            Document::load_mem(bytes).map_err(|err| ExtractionError::Unparsable(err.to_string()))?;
        let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
        if page_numbers.is_empty() {
            return Err(ExtractionError::NoPages);
        }

        let pages = page_numbers
            .into_iter()
            .map(|number| (number, document.extract_text(&[number])));
        Ok(assemble_pages(pages))
    }
}

/// Build a document from per-page extraction results, keeping failed pages as empty text.
pub fn assemble_pages<I, E>(pages: I) -> ExtractedDocument
where
    I: IntoIterator<Item = (u32, Result<String, E>)>,
    E: Display,
{
    let mut failed = 0usize;
    let texts: Vec<String> = pages
        .into_iter()
        .map(|(number, result)| match result {
            Ok(raw) => normalize_page_text(&raw),
            Err(error) => {
                failed += 1;
                tracing::warn!(page = number, error = %error, "Page text extraction failed");
                String::new()
            }
        })
        .collect();

    let document = ExtractedDocument::from_pages(texts);
    tracing::debug!(
        pages = document.page_count(),
        failed_pages = failed,
        chars = document.full_text().len(),
        "Extracted document text"
    );
    document
}

#[cfg(test)]
#[path = "../../tests/common/mod.rs"]
pub(crate) mod fixtures;
