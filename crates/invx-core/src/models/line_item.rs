//! Invoice line item and document models.

use std::fmt;
use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Primary product code printed on a supplier invoice row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryCode {
    /// Case.
    #[serde(rename = "CAS")]
    Cas,
    /// Pack.
    #[serde(rename = "PK")]
    Pk,
    /// Bag.
    #[serde(rename = "BAG")]
    Bag,
    /// Could not be resolved to one of the canonical codes.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl PrimaryCode {
    /// The canonical codes, in resolution order.
    pub const CANONICAL: [PrimaryCode; 3] = [PrimaryCode::Cas, PrimaryCode::Pk, PrimaryCode::Bag];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryCode::Cas => "CAS",
            PrimaryCode::Pk => "PK",
            PrimaryCode::Bag => "BAG",
            PrimaryCode::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != PrimaryCode::Unknown
    }
}

impl fmt::Display for PrimaryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    /// Ounce.
    Oz,
    /// Pound.
    Lb,
    /// Piece.
    Pc,
    /// Not a recognized unit. A valid result, not an error.
    Unknown,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Oz => "OZ",
            Unit::Lb => "LB",
            Unit::Pc => "PC",
            Unit::Unknown => "UNKNOWN",
        }
    }

    /// Suffix used when a measure is rendered back into product text.
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Oz => "oz",
            Unit::Lb => "lb",
            Unit::Pc => "pc",
            Unit::Unknown => "",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package size such as `14oz` or `2lb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub amount: Decimal,
    pub unit: Unit,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.unit.suffix())
    }
}

/// How much heuristic fallback was needed to build a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParseConfidence {
    /// Every expected field was found (possibly after rule-table corrections).
    High,
    /// At least one field fell back to its default.
    Partial,
    /// Quantities, codes and costs were all unresolved. Never appears in a document.
    Failed,
}

impl ParseConfidence {
    /// Lower the confidence to at most `other`.
    pub fn cap(self, other: ParseConfidence) -> ParseConfidence {
        self.max(other)
    }
}

/// How the invoice text was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Embedded PDF text.
    Native,
    /// Text recognized from scanned pages.
    #[default]
    Ocr,
}

impl ExtractionMode {
    pub fn is_ocr(&self) -> bool {
        *self == ExtractionMode::Ocr
    }
}

/// One physical invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    /// Quantity ordered.
    pub purchased_qty: Decimal,

    /// Quantity delivered.
    pub received_qty: Decimal,

    /// Primary product code.
    pub code1: PrimaryCode,

    /// Free-form supplier product code, at most 8 characters.
    pub code2: String,

    pub brand: String,

    /// Category/type text.
    pub description: String,

    /// Full descriptive text, starting with the description.
    pub product: String,

    pub cost_per_packet: Decimal,

    pub total_cost: Decimal,

    /// Count printed in parentheses, `1` when absent.
    pub units_per_packet: NonZeroU32,

    /// Package size found in the product text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<Measure>,

    pub unit_cost: Decimal,

    pub tentative_price: Decimal,

    /// The segmented line exactly as it was read.
    pub raw_text: String,

    pub parse_confidence: ParseConfidence,
}

/// Where a document's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Input file name, if the text came from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    pub mode: ExtractionMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// Ordered line items of one converted invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub source: SourceInfo,
    pub items: Vec<InvoiceLineItem>,
}

/// Record counts per confidence level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceCounts {
    pub high: usize,
    pub partial: usize,
}

impl InvoiceDocument {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the `total_cost` column.
    pub fn total_cost_sum(&self) -> Decimal {
        self.items.iter().map(|i| i.total_cost).sum()
    }

    pub fn confidence_counts(&self) -> ConfidenceCounts {
        self.items
            .iter()
            .fold(ConfidenceCounts::default(), |mut acc, item| {
                match item.parse_confidence {
                    ParseConfidence::High => acc.high += 1,
                    ParseConfidence::Partial => acc.partial += 1,
                    ParseConfidence::Failed => {}
                }
                acc
            })
    }
}
