//! Embedded text of PDF invoices.
//!
//! Only the text layer is read. Scanned PDFs carry no text and are rejected
//! with [`PdfError::NoText`]; their OCR output goes in as a text file instead.

mod extractor;

pub use extractor::{PdfContent, PdfExtractor, PdfPage};

use crate::error::PdfError;

/// What a loaded PDF offers the line extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Enough embedded text to extract invoice lines from.
    Text,
    /// No usable embedded text (scanned document or blank pages).
    Empty,
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// A backend able to read the text layer of a PDF.
pub trait PdfProcessor {
    /// Parse the document, decrypting it if it uses an empty password.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Pages of the loaded document, 0 before `load`.
    fn page_count(&self) -> u32;

    /// Text of all pages, separated by form feeds.
    fn extract_text(&self) -> Result<String>;
}
