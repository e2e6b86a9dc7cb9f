//! Error types for the invx-core library.
//!
//! Only document-level failures are errors. Problems with individual
//! candidate lines are reported through [`crate::engine::LineOutcome`] and the
//! run log instead.

use thiserror::Error;

/// Main error type for the invx library.
#[derive(Error, Debug)]
pub enum InvxError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Run-level engine failure.
    #[error("extraction error: {0}")]
    Engine(#[from] EngineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading text out of PDF files.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The PDF has (almost) no embedded text; it needs OCR first.
    #[error("PDF has only {chars} characters of embedded text, run OCR and pass the text file instead")]
    NoText { chars: usize },
}

/// Run-level failures of the extraction engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No line in the whole input looked like the start of an invoice item.
    ///
    /// This points at a text source problem (bad OCR, wrong file), not at an
    /// invoice without items.
    #[error("no invoice line items found in {lines_scanned} lines of text")]
    DocumentEmpty { lines_scanned: usize },

    /// The caller raised the cancellation flag while lines were still being read.
    #[error("extraction cancelled after {items_emitted} items")]
    Cancelled { items_emitted: usize },
}

/// Result type for the invx library.
pub type Result<T> = std::result::Result<T, InvxError>;
