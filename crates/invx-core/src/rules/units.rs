//! Unit-of-measure normalization.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::line_item::{Measure, Unit};

use super::corrector::{correct_token_with, CorrectionContext};
use super::tables::RuleTables;

/// Normalize a unit token using the built-in tables.
pub fn normalize_unit(token: &str) -> Unit {
    normalize_unit_with(token, RuleTables::builtin())
}

/// Normalize a unit token to `OZ`, `LB`, `PC` or `UNKNOWN`.
///
/// Case and trailing punctuation are ignored. Tokens containing digits are
/// retried after ALPHA correction (`0z` -> `oz`).
pub fn normalize_unit_with(token: &str, tables: &RuleTables) -> Unit {
    let trimmed = token
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!'));
    if trimmed.is_empty() {
        return Unit::Unknown;
    }

    if let Some(unit) = tables.unit_alias(&trimmed.to_lowercase()) {
        return unit;
    }

    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        let corrected = correct_token_with(trimmed, CorrectionContext::Alpha, tables);
        if corrected != trimmed {
            if let Some(unit) = tables.unit_alias(&corrected.to_lowercase()) {
                return unit;
            }
        }
    }

    Unit::Unknown
}

/// Split a size token such as `14oz`, `3.5lb` or `140z` into a measure.
///
/// Glyphs at the end of the numeric part are tried as part of the unit, so
/// `140z` reads as `14` + `0z` (= `oz`).
pub fn split_measure_with(token: &str, tables: &RuleTables) -> Option<Measure> {
    let token = token.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';'));
    let numeric_len = token
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(token.len());

    if numeric_len == 0 || numeric_len == token.len() {
        return None;
    }

    // Try the longest number first, then give up to two trailing glyphs to the unit.
    for back in 0..=2usize {
        let Some(split) = numeric_len.checked_sub(back) else {
            break;
        };
        if split == 0 {
            break;
        }
        let (number, unit) = token.split_at(split);
        let Ok(amount) = Decimal::from_str(number.trim_end_matches('.')) else {
            continue;
        };
        match normalize_unit_with(unit, tables) {
            Unit::Unknown => continue,
            unit => return Some(Measure { amount, unit }),
        }
    }

    None
}

/// Split a size token using the built-in tables.
pub fn split_measure(token: &str) -> Option<Measure> {
    split_measure_with(token, RuleTables::builtin())
}
