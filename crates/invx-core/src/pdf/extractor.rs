//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// Page separator written by the text extractor.
const FORM_FEED: char = '\u{000C}';

/// Reads the text layer of a PDF: lopdf for structure and decryption,
/// pdf-extract for the text itself.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_text_length: usize,
}

/// Embedded text of a PDF, page by page.
#[derive(Debug, Clone)]
pub struct PdfContent {
    pub pdf_type: PdfType,
    /// Pages in document order.
    pub pages: Vec<PdfPage>,
    /// Number of pages in the document.
    pub page_count: u32,
}

/// Text of a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    pub text: String,
}

impl PdfContent {
    pub fn text_len(&self) -> usize {
        self.pages.iter().map(|p| p.text.trim().len()).sum()
    }
}

impl PdfExtractor {
    /// Documents with less than `min_text_length` characters of embedded text
    /// are reported as [`PdfType::Empty`].
    pub fn new(min_text_length: usize) -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_text_length,
        }
    }

    /// Extract the text of every page.
    ///
    /// Fails with [`PdfError::NoText`] when the document carries no usable text.
    pub fn extract_all(&self) -> Result<PdfContent> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let text = self.extract_text()?;
        let pages = split_pages(&text, page_count);
        let content = PdfContent {
            pdf_type: self.classify(pages.iter().map(|p| p.text.trim().len()).sum()),
            pages,
            page_count,
        };

        debug!(
            "PDF analysis: {} pages, {} chars text -> {:?}",
            page_count,
            content.text_len(),
            content.pdf_type
        );

        if content.pdf_type == PdfType::Empty {
            return Err(PdfError::NoText {
                chars: content.text_len(),
            });
        }
        Ok(content)
    }

    fn classify(&self, text_len: usize) -> PdfType {
        if text_len >= self.min_text_length.max(1) {
            PdfType::Text
        } else {
            PdfType::Empty
        }
    }
}

/// Split extracted text on form feeds. Text without separators stays one page.
fn split_pages(text: &str, page_count: u32) -> Vec<PdfPage> {
    let parts: Vec<&str> = text.split(FORM_FEED).collect();
    let parts: Vec<&str> = if parts.len() > 1 && parts.len() as u32 > page_count {
        // trailing separator after the last page
        parts
            .iter()
            .copied()
            .filter(|p| !p.trim().is_empty())
            .collect()
    } else {
        parts
    };

    parts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PdfPage {
            number: i as u32 + 1,
            text: text.to_string(),
        })
        .collect()
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(crate::models::config::PdfConfig::default().min_text_length)
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        self.raw_data = if doc.is_encrypted() {
            // Only the empty user password is tried.
            doc.decrypt("").map_err(|_| PdfError::Encrypted)?;
            let mut plain = Vec::new();
            doc.save_to(&mut plain)
                .map_err(|e| PdfError::Parse(format!("cannot re-save decrypted PDF: {}", e)))?;
            debug!("Decrypted PDF, {} bytes after re-save", plain.len());
            plain
        } else {
            data.to_vec()
        };

        debug!("Loaded PDF with {} pages", doc.get_pages().len());
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        Ok(text)
    }
}
