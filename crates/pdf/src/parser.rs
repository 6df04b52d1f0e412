//! PDF file parser implementation.

use lopdf::{Document, Object};
use quizzard_core::text::clean_block;
use quizzard_core::{DocumentFormat, Error, Extractor, ImageHandle, NormalizedContent, Result};
use std::path::Path;

/// Parser for PDF documents.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PDF held in memory.
    ///
    /// One text block per page, in page-number order. A page whose text cannot
    /// be decoded yields an empty block so later pages keep their position.
    pub fn parse_bytes(&self, data: &[u8]) -> Result<NormalizedContent> {
        let document = Document::load_mem(data)
            .map_err(|e| Error::PdfParseError(format!("Failed to load PDF: {}", e)))?;

        let mut content = NormalizedContent::empty();

        for (page_number, _) in document.get_pages() {
            let text = match document.extract_text(&[page_number]) {
                Ok(text) => clean_block(&text),
                Err(e) => {
                    log::warn!("Could not extract text from page {}: {}", page_number, e);
                    String::new()
                }
            };
            content.text.push(text);
        }

        content.images = self.collect_images(&document);

        log::debug!(
            "PDF: {} page(s), {} image(s)",
            content.text.len(),
            content.images.len()
        );

        Ok(content)
    }

    /// Image XObject streams, in object-id order.
    fn collect_images(&self, document: &Document) -> Vec<ImageHandle> {
        document
            .objects
            .iter()
            .filter_map(|(id, object)| match object {
                Object::Stream(stream) if is_image(stream.dict.get(b"Subtype")) => Some(
                    ImageHandle::new(format!("obj{}_{}", id.0, id.1), stream.content.clone()),
                ),
                _ => None,
            })
            .collect()
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, path: &Path) -> Result<NormalizedContent> {
        let data = std::fs::read(path)?;
        self.parse_bytes(&data)
    }
}

fn is_image(subtype: lopdf::Result<&Object>) -> bool {
    matches!(subtype, Ok(Object::Name(name)) if name.as_slice() == b"Image")
}
