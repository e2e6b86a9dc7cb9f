//! Substitution, unit-alias and code tables.
//!
//! The tables are plain key -> value data. Built-in entries can be extended
//! from [`RulesConfig`] without touching any parsing code.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use tracing::warn;

use crate::models::config::RulesConfig;
use crate::models::line_item::{PrimaryCode, Unit};

/// Glyph sequences that OCR produces in place of digits.
const NUMERIC_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("O", "0"),
    ("o", "0"),
    ("QO", "0"),
    ("l", "1"),
    ("I", "1"),
    ("i", "1"),
    ("|", "1"),
    ("il", "1"),
    ("iI", "1"),
    ("al", "1"),
    ("aI", "1"),
    ("ul", "1"),
    ("Z", "2"),
    ("z", "2"),
    ("S", "5"),
    ("E", "5"),
    ("B", "8"),
    (":", "."),
];

/// Digits that OCR produces in place of letters.
const ALPHA_SUBSTITUTIONS: &[(char, char)] = &[('0', 'O'), ('1', 'l'), ('5', 'S'), ('8', 'B')];

const UNIT_ALIASES: &[(&str, Unit)] = &[
    ("oz", Unit::Oz),
    ("ozs", Unit::Oz),
    ("ounce", Unit::Oz),
    ("ounces", Unit::Oz),
    ("lb", Unit::Lb),
    ("lbs", Unit::Lb),
    ("ib", Unit::Lb),
    ("pound", Unit::Lb),
    ("pounds", Unit::Lb),
    ("pc", Unit::Pc),
    ("pcs", Unit::Pc),
    ("pce", Unit::Pc),
    ("piece", Unit::Pc),
    ("pieces", Unit::Pc),
];

lazy_static! {
    static ref BUILTIN: RuleTables = RuleTables::build(&RulesConfig::default());
}

/// Lookup tables used by the corrector, the unit normalizer and the code resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTables {
    /// Numeric substitutions, longest key first.
    numeric: Vec<(String, String)>,
    alpha: BTreeMap<char, char>,
    units: BTreeMap<String, Unit>,
    codes: BTreeMap<String, PrimaryCode>,
}

impl RuleTables {
    /// The built-in tables, shared by every caller that has no configuration.
    pub fn builtin() -> &'static RuleTables {
        &BUILTIN
    }

    /// Built-in tables extended with configured entries.
    pub fn from_config(config: &RulesConfig) -> RuleTables {
        Self::build(config)
    }

    fn build(config: &RulesConfig) -> RuleTables {
        let mut numeric: BTreeMap<String, String> = NUMERIC_SUBSTITUTIONS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (from, to) in &config.numeric {
            if is_valid_numeric_rule(from, to) {
                numeric.insert(from.clone(), to.clone());
            } else {
                warn!("Ignoring numeric substitution {:?} -> {:?}", from, to);
            }
        }
        let mut numeric: Vec<(String, String)> = numeric.into_iter().collect();
        numeric.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let mut alpha: BTreeMap<char, char> = ALPHA_SUBSTITUTIONS.iter().copied().collect();
        for (from, to) in &config.alpha {
            match (single_char(from), single_char(to)) {
                (Some(f), Some(t)) if f.is_ascii_digit() && t.is_alphabetic() => {
                    alpha.insert(f, t);
                }
                _ => warn!("Ignoring alpha substitution {:?} -> {:?}", from, to),
            }
        }

        let mut units: BTreeMap<String, Unit> = UNIT_ALIASES
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        for (alias, unit) in &config.unit_aliases {
            units.insert(alias.to_lowercase(), *unit);
        }

        let mut codes: BTreeMap<String, PrimaryCode> = PrimaryCode::CANONICAL
            .iter()
            .map(|c| (c.as_str().to_string(), *c))
            .collect();
        for (alias, code) in &config.code_aliases {
            if code.is_known() && !alias.is_empty() {
                codes.insert(alias.clone(), *code);
            }
        }

        RuleTables {
            numeric,
            alpha,
            units,
            codes,
        }
    }

    /// Numeric substitutions in matching order (longest key first).
    pub fn numeric_entries(&self) -> &[(String, String)] {
        &self.numeric
    }

    /// Digit for a single confusable glyph.
    pub fn numeric_glyph(&self, c: char) -> Option<char> {
        self.numeric.iter().find_map(|(from, to)| {
            let mut from_chars = from.chars();
            let mut to_chars = to.chars();
            match (from_chars.next(), from_chars.next(), to_chars.next(), to_chars.next()) {
                (Some(f), None, Some(t), None) if f == c && t.is_ascii_digit() => Some(t),
                _ => None,
            }
        })
    }

    /// Letter for a digit that stands in for it.
    pub fn alpha_glyph(&self, c: char) -> Option<char> {
        self.alpha.get(&c).copied()
    }

    /// Canonical unit for a lowercase spelling.
    pub fn unit_alias(&self, spelling: &str) -> Option<Unit> {
        self.units.get(spelling).copied()
    }

    /// Spellings accepted for primary codes and the code each one means.
    pub fn code_spellings(&self) -> impl Iterator<Item = (&str, PrimaryCode)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        RuleTables::builtin().clone()
    }
}

/// A numeric rule must produce digits only and must not be able to match
/// inside its own output, so that corrections stay idempotent.
fn is_valid_numeric_rule(from: &str, to: &str) -> bool {
    let numeric_glyph = |c: char| c.is_ascii_digit() || c == '.' || c == '-';
    !from.is_empty()
        && !to.is_empty()
        && from.chars().any(|c| !numeric_glyph(c))
        && to.chars().all(numeric_glyph)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
