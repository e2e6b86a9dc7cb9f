//! Data models shared by the engine and its callers.

pub mod config;
pub mod line_item;

pub use config::{
    ExtractionConfig, InvxConfig, PdfConfig, PricingConfig, RulesConfig, SegmentationConfig,
    UnitCostBasis,
};
pub use line_item::{
    ConfidenceCounts, ExtractionMode, InvoiceDocument, InvoiceLineItem, Measure, ParseConfidence,
    PrimaryCode, SourceInfo, Unit,
};
