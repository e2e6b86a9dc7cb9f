//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvxError;
use crate::models::line_item::{PrimaryCode, Unit};

/// Main configuration for the invx pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvxConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Line segmentation configuration.
    pub segmentation: SegmentationConfig,

    /// Extensions to the built-in rule tables.
    pub rules: RulesConfig,

    /// Derived price configuration.
    pub pricing: PricingConfig,

    /// PDF text source configuration.
    pub pdf: PdfConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Numbers above this are never read as quantities.
    pub max_quantity: Decimal,

    /// Longest accepted secondary code.
    pub code2_max_len: usize,

    /// Brand names recognized anywhere in the product text.
    pub known_brands: Vec<String>,

    /// Description phrases recognized right after the brand.
    pub known_descriptions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_quantity: Decimal::from(100),
            code2_max_len: 8,
            known_brands: ["Deep", "Bre", "Mirch", "Bansi", "Britanni", "Sujata", "Chandan", "Hem", "MDH"]
                .into_iter()
                .map(String::from)
                .collect(),
            known_descriptions: ["F S", "Flo", "Diges", "Pres", "Spi"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Line segmentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Maximum token distance between the quantity and the code of an anchor,
    /// and the token position the anchor pair must start before.
    pub anchor_window: usize,

    /// Lines containing any of these are headers/footers and are dropped.
    pub ignore_markers: Vec<String>,

    /// Lines starting with this prefix are page separators.
    pub page_marker: String,

    /// How many source lines are read between two cancellation checks.
    pub cancel_check_interval: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            anchor_window: 3,
            ignore_markers: ["CONTINUED", "COPY", "Free!", "Suggested"]
                .into_iter()
                .map(String::from)
                .collect(),
            page_marker: "=== Page".to_string(),
            cancel_check_interval: 64,
        }
    }
}

/// Extra rule-table entries, merged over the built-in tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Noisy glyph sequence -> digits, used in numeric tokens.
    pub numeric: BTreeMap<String, String>,

    /// Digit -> letter, used in otherwise alphabetic tokens.
    pub alpha: BTreeMap<String, String>,

    /// Noisy unit spelling (lowercase) -> canonical unit.
    pub unit_aliases: BTreeMap<String, Unit>,

    /// Extra exact spellings of primary codes.
    pub code_aliases: BTreeMap<String, PrimaryCode>,
}

/// Which cost is spread over the units in a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCostBasis {
    /// `cost_per_packet / units_per_packet`.
    #[default]
    PerPacket,
    /// `total_cost / units_per_packet`.
    TotalCost,
}

/// Derived price configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Multiplier applied to the tentative price.
    pub markup: Decimal,

    pub unit_cost_basis: UnitCostBasis,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            markup: Decimal::ONE,
            unit_cost_basis: UnitCostBasis::PerPacket,
        }
    }
}

/// PDF text source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum embedded text length to treat a PDF as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 20 }
    }
}

impl InvxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, InvxError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvxError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), InvxError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| InvxError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
