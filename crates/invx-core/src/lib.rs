//! Core library for converting noisy invoice text into line items.
//!
//! This crate provides:
//! - Rule tables and pure normalizers for OCR noise, units and product codes
//! - A line segmenter and field extractor for free-form invoice rows
//! - Derived unit cost and tentative price calculation
//! - Text sources for plain text (OCR output) and PDFs with embedded text

pub mod engine;
pub mod error;
pub mod models;
pub mod pdf;
pub mod rules;
pub mod source;

pub use engine::{Engine, LineOutcome, LogEntry, LogKind, RunLog, Severity};
pub use error::{EngineError, InvxError, PdfError, Result};
pub use models::config::InvxConfig;
pub use models::line_item::{
    ExtractionMode, InvoiceDocument, InvoiceLineItem, Measure, ParseConfidence, PrimaryCode,
    SourceInfo, Unit,
};
pub use source::{open_source, SourceText, TextSource};
