//! Primary product code resolution.

use strsim::levenshtein;

use crate::models::line_item::PrimaryCode;

use super::tables::RuleTables;

/// Longest token that is still considered a primary code.
pub const MAX_CODE_LEN: usize = 4;

/// Largest edit distance accepted as a single-glyph OCR error.
pub const MAX_CODE_DISTANCE: usize = 1;

/// Resolve a primary code token using the built-in tables.
pub fn resolve_code(token: &str) -> PrimaryCode {
    resolve_code_with(token, RuleTables::builtin())
}

/// Resolve a primary code token.
///
/// An exact spelling wins. Otherwise the nearest code within edit distance 1
/// is accepted, unless two different codes are equally near.
pub fn resolve_code_with(token: &str, tables: &RuleTables) -> PrimaryCode {
    if token.is_empty() || token.chars().count() > MAX_CODE_LEN {
        return PrimaryCode::Unknown;
    }

    if let Some((_, code)) = tables.code_spellings().find(|(spelling, _)| *spelling == token) {
        return code;
    }

    let mut best: Option<(usize, PrimaryCode)> = None;
    let mut tied = false;

    for (spelling, code) in tables.code_spellings() {
        let distance = levenshtein(token, spelling);
        if distance > MAX_CODE_DISTANCE {
            continue;
        }
        match best {
            None => best = Some((distance, code)),
            Some((d, _)) if distance < d => {
                best = Some((distance, code));
                tied = false;
            }
            Some((d, c)) if distance == d && c != code => tied = true,
            Some(_) => {}
        }
    }

    match best {
        Some((_, code)) if !tied => code,
        _ => PrimaryCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_codes() {
        assert_eq!(resolve_code("CAS"), PrimaryCode::Cas);
        assert_eq!(resolve_code("PK"), PrimaryCode::Pk);
        assert_eq!(resolve_code("BAG"), PrimaryCode::Bag);
    }

    #[test]
    fn test_single_glyph_errors() {
        assert_eq!(resolve_code("CA5"), PrimaryCode::Cas);
        assert_eq!(resolve_code("CA"), PrimaryCode::Cas);
        assert_eq!(resolve_code("P"), PrimaryCode::Pk);
        assert_eq!(resolve_code("PKG"), PrimaryCode::Pk);
        assert_eq!(resolve_code("8AG"), PrimaryCode::Bag);
        assert_eq!(resolve_code("BA5"), PrimaryCode::Bag);
    }

    #[test]
    fn test_ties_are_unknown() {
        // one edit away from both CAS and BAG
        assert_eq!(resolve_code("CAG"), PrimaryCode::Unknown);
        assert_eq!(resolve_code("BAS"), PrimaryCode::Unknown);
    }

    #[test]
    fn test_far_or_long_tokens_are_unknown() {
        assert_eq!(resolve_code("XYZ"), PrimaryCode::Unknown);
        assert_eq!(resolve_code("cas"), PrimaryCode::Unknown);
        assert_eq!(resolve_code("CASES"), PrimaryCode::Unknown);
        assert_eq!(resolve_code(""), PrimaryCode::Unknown);
        assert_eq!(resolve_code("12"), PrimaryCode::Unknown);
    }
}
