//! OCR character correction.
//!
//! Corrections are pure functions of the token, the context and the rule
//! tables. Each context is idempotent: correcting an already corrected token
//! returns it unchanged.

use super::tables::RuleTables;

/// What kind of value a token is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectionContext {
    /// Quantities, prices, counts.
    Numeric,
    /// Product codes: letters are legitimate, only a numeric suffix is corrected.
    Code,
    /// Words such as units: digits that stand in for letters are replaced.
    Alpha,
}

/// Correct a token using the built-in tables.
pub fn correct_token(token: &str, context: CorrectionContext) -> String {
    correct_token_with(token, context, RuleTables::builtin())
}

/// Correct a token using the given tables.
pub fn correct_token_with(token: &str, context: CorrectionContext, tables: &RuleTables) -> String {
    match context {
        CorrectionContext::Numeric => {
            correct_numeric(token, tables).unwrap_or_else(|| token.to_string())
        }
        CorrectionContext::Code => correct_code(token, tables),
        CorrectionContext::Alpha => correct_alpha(token, tables),
    }
}

/// All-or-nothing: every glyph must be a digit, `.`, `-` or a table key,
/// otherwise the token is not a mangled number and `None` is returned.
fn correct_numeric(token: &str, tables: &RuleTables) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(token.len());
    let mut rest = token;

    'scan: while let Some(c) = rest.chars().next() {
        for (from, to) in tables.numeric_entries() {
            if rest.starts_with(from.as_str()) {
                out.push_str(to);
                rest = &rest[from.len()..];
                continue 'scan;
            }
        }

        if c.is_ascii_digit() || c == '.' || c == '-' {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        } else {
            return None;
        }
    }

    Some(out)
}

fn correct_code(token: &str, tables: &RuleTables) -> String {
    let mut out = String::with_capacity(token.len());

    for c in token.chars() {
        let after_digit = out.chars().last().is_some_and(|p| p.is_ascii_digit());
        match tables.numeric_glyph(c) {
            Some(digit) if after_digit && !c.is_ascii_digit() => out.push(digit),
            _ => out.push(c),
        }
    }

    out
}

fn correct_alpha(token: &str, tables: &RuleTables) -> String {
    let has_letter = token.chars().any(|c| c.is_alphabetic());
    let all_mappable = token
        .chars()
        .all(|c| c.is_alphabetic() || tables.alpha_glyph(c).is_some());

    if !has_letter || !all_mappable {
        return token.to_string();
    }

    token
        .chars()
        .map(|c| {
            if c.is_alphabetic() {
                c
            } else {
                tables.alpha_glyph(c).unwrap_or(c)
            }
        })
        .collect()
}
