//! Field extraction for one candidate line.

use std::num::NonZeroU32;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::config::{ExtractionConfig, SegmentationConfig};
use crate::models::line_item::{
    ExtractionMode, InvoiceLineItem, Measure, ParseConfidence, PrimaryCode, Unit,
};
use crate::rules::corrector::{correct_token_with, CorrectionContext};
use crate::rules::patterns::{CURRENCY_AMOUNT, PACK_COUNT, QUANTITY, SECONDARY_CODE};
use crate::rules::{normalize_unit_with, resolve_code_with, split_measure_with, RuleTables};

use super::derived::round_currency;
use super::log::{LogEntry, LogKind, RunLog};
use super::segmenter::CandidateLine;
use super::tokens::{tokenize, Token, TokenKind};

/// Why a candidate line produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Nothing to tokenize.
    Blank,
    /// Quantities, primary code and costs were all missing.
    Unresolved,
}

impl FailureReason {
    pub fn describe(&self) -> &'static str {
        match self {
            FailureReason::Blank => "blank line",
            FailureReason::Unresolved => "no quantity, product code or cost found",
        }
    }
}

/// A dropped candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub raw_text: String,
    pub line_number: Option<usize>,
    pub reason: FailureReason,
}

/// Result of extracting one candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Parsed(InvoiceLineItem),
    Skipped(LineFailure),
}

impl LineOutcome {
    pub fn item(&self) -> Option<&InvoiceLineItem> {
        match self {
            LineOutcome::Parsed(item) => Some(item),
            LineOutcome::Skipped(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, LineOutcome::Parsed(_))
    }
}

/// Numeric value of a quantity token, if it is one.
///
/// Sizes (`14oz`) and currency amounts are never quantities, nor is anything
/// above `max`.
pub(crate) fn quantity_value(token: &Token, max: Decimal, tables: &RuleTables) -> Option<Decimal> {
    if token.kind != TokenKind::Word
        || !token.has_digit()
        || split_measure_with(&token.text, tables).is_some()
    {
        return None;
    }
    let corrected = correct_token_with(&token.text, CorrectionContext::Numeric, tables);
    if !QUANTITY.is_match(&corrected) || CURRENCY_AMOUNT.is_match(&corrected) {
        return None;
    }
    Decimal::from_str(&corrected).ok().filter(|q| *q <= max)
}

/// Primary code of a token, `Unknown` for anything but plain words.
pub(crate) fn primary_code(token: &Token, tables: &RuleTables) -> PrimaryCode {
    match token.kind {
        TokenKind::Word => resolve_code_with(&token.text, tables),
        _ => PrimaryCode::Unknown,
    }
}

/// Index of the first primary code paired with a quantity.
///
/// A pair is at most `window` tokens apart and one of the two sits among the
/// first `window` tokens of the line. Without quantities, only a code among
/// the first `window` tokens counts.
pub(crate) fn paired_code(
    tokens: &[Token],
    quantities: &[usize],
    window: usize,
    tables: &RuleTables,
) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| primary_code(t, tables).is_known())
        .map(|(c, _)| c)
        .find(|&c| {
            if quantities.is_empty() {
                return c < window;
            }
            quantities
                .iter()
                .any(|&q| q != c && q.abs_diff(c) <= window && q.min(c) < window)
        })
}

/// Parses candidate lines into line items.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'a> {
    config: &'a ExtractionConfig,
    tables: &'a RuleTables,
    anchor_window: usize,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig, tables: &'a RuleTables) -> Self {
        Self {
            config,
            tables,
            anchor_window: SegmentationConfig::default().anchor_window,
        }
    }

    /// How far from a quantity the primary code may sit.
    pub fn with_anchor_window(mut self, window: usize) -> Self {
        self.anchor_window = window;
        self
    }

    /// Extract one record from a candidate line.
    ///
    /// Missing fields fall back to defaults and lower the confidence to
    /// PARTIAL. Only a line without quantities, primary code and costs is
    /// skipped; it leaves exactly one entry in `log`.
    pub fn extract(&self, line: &CandidateLine, mode: ExtractionMode, log: &mut RunLog) -> LineOutcome {
        let raw = line.text.as_str();
        let at = line.line_number;
        let tokens = tokenize(raw);

        if tokens.is_empty() {
            return self.skip(line, FailureReason::Blank, log);
        }

        let mut used = vec![false; tokens.len()];
        let mut notes = Vec::new();

        // Primary code, next to a quantity
        let quantity_positions: Vec<usize> = (0..tokens.len())
            .filter(|&i| self.quantity(&tokens[i]).is_some())
            .collect();
        let code_idx = paired_code(&tokens, &quantity_positions, self.anchor_window, self.tables);
        let code1 = code_idx
            .map(|i| primary_code(&tokens[i], self.tables))
            .unwrap_or(PrimaryCode::Unknown);
        if let Some(i) = code_idx {
            used[i] = true;
        }

        // Quantities: before the code, or the leading numbers when there is none
        let search_end = code_idx.unwrap_or_else(|| {
            tokens
                .iter()
                .position(|t| self.quantity(t).is_none())
                .unwrap_or(tokens.len())
        });
        let mut quantities: Vec<(usize, Decimal)> = (0..search_end)
            .filter_map(|i| self.quantity(&tokens[i]).map(|q| (i, q)))
            .take(2)
            .collect();
        // `12 O CAS`: received read as letters
        if quantities.len() == 1 {
            let next = quantities[0].0 + 1;
            if code_idx.is_none_or(|c| next < c) {
                if let Some(received) = tokens.get(next).and_then(|t| self.glyph_quantity(t)) {
                    quantities.push((next, received));
                }
            }
        }
        for (i, _) in &quantities {
            used[*i] = true;
        }

        // Secondary code right after the primary one
        let mut code2 = String::new();
        if let Some(next) = code_idx.map(|i| i + 1).filter(|&j| j < tokens.len()) {
            if let Some(code) = self.secondary_code(&tokens[next], mode) {
                used[next] = true;
                code2 = code;
            }
        }

        // Costs in order of appearance; an unreadable amount keeps its slot empty
        let mut costs: [Option<Decimal>; 2] = [None; 2];
        let mut slot = 0;
        for (i, token) in tokens.iter().enumerate() {
            if slot == costs.len() {
                break;
            }
            if used[i] || token.kind == TokenKind::Paren || !token.has_digit() {
                continue;
            }
            let corrected = correct_token_with(&token.text, CorrectionContext::Numeric, self.tables);
            if CURRENCY_AMOUNT.is_match(&corrected) {
                if let Ok(value) = Decimal::from_str(&corrected.replace(',', "")) {
                    used[i] = true;
                    costs[slot] = Some(value);
                    slot += 1;
                    continue;
                }
            }
            if token.kind == TokenKind::Currency {
                used[i] = true;
                slot += 1;
                notes.push(LogEntry::invalid_numeric(at, raw, "cost", &token.text));
            }
        }

        if quantities.is_empty() && !code1.is_known() && costs.iter().all(Option::is_none) {
            return self.skip(line, FailureReason::Unresolved, log);
        }

        let (purchased_qty, received_qty) = match quantities.as_slice() {
            [(_, purchased), (_, received), ..] => (*purchased, *received),
            [(_, purchased)] => {
                notes.push(LogEntry::partial_field(at, raw, "received_qty", "purchased_qty"));
                (*purchased, *purchased)
            }
            [] => {
                notes.push(LogEntry::partial_field(at, raw, "purchased_qty and received_qty", "0"));
                (Decimal::ZERO, Decimal::ZERO)
            }
        };

        if !code1.is_known() {
            notes.push(LogEntry::partial_field(at, raw, "code1", "UNKNOWN"));
        }

        let cost_fields = ["cost_per_packet", "total_cost"];
        for field in cost_fields.iter().skip(slot) {
            notes.push(LogEntry::partial_field(at, raw, field, "0.00"));
        }
        let cost_per_packet = costs[0].unwrap_or(Decimal::ZERO);
        let total_cost = costs[1].unwrap_or(Decimal::ZERO);

        if costs.iter().all(Option::is_some) && !quantities.is_empty() {
            let by_purchased = round_currency(cost_per_packet.saturating_mul(purchased_qty));
            let by_received = round_currency(cost_per_packet.saturating_mul(received_qty));
            if total_cost != by_purchased && total_cost != by_received {
                notes.push(LogEntry::total_mismatch(
                    at,
                    raw,
                    format!(
                        "total_cost {} differs from {} x {}",
                        total_cost, cost_per_packet, purchased_qty
                    ),
                ));
            }
        }

        let units_per_packet = self.units_per_packet(&tokens, &mut used, at, raw, &mut notes);

        // Descriptive text
        let anchor_tokens = tokenize(line.anchor()).len().min(tokens.len());
        let words = self.text_run(&tokens, &used, anchor_tokens);
        let measure = words.iter().find_map(|w| w.measure);
        let words: Vec<String> = words.into_iter().map(|w| w.text).collect();
        if words.is_empty() {
            notes.push(LogEntry::partial_field(at, raw, "product text", "empty"));
        }
        let (brand, description, product) = self.split_text(&words);

        let parse_confidence = notes
            .iter()
            .filter(|n| matches!(n.kind, LogKind::PartialField | LogKind::InvalidNumericFormat))
            .fold(ParseConfidence::High, |confidence, _| confidence.cap(ParseConfidence::Partial));

        debug!(
            line = at.unwrap_or(0),
            code1 = %code1,
            confidence = ?parse_confidence,
            "Parsed line: {}",
            raw
        );
        log.extend(notes);

        LineOutcome::Parsed(InvoiceLineItem {
            purchased_qty,
            received_qty,
            code1,
            code2,
            brand,
            description,
            product,
            cost_per_packet,
            total_cost,
            units_per_packet,
            measure,
            unit_cost: Decimal::ZERO,
            tentative_price: Decimal::ZERO,
            raw_text: line.text.clone(),
            parse_confidence,
        })
    }

    fn skip(&self, line: &CandidateLine, reason: FailureReason, log: &mut RunLog) -> LineOutcome {
        log.push(LogEntry::line_failure(line.line_number, &line.text, reason.describe()));
        LineOutcome::Skipped(LineFailure {
            raw_text: line.text.clone(),
            line_number: line.line_number,
            reason,
        })
    }

    fn quantity(&self, token: &Token) -> Option<Decimal> {
        quantity_value(token, self.config.max_quantity, self.tables)
    }

    /// A short token made only of glyphs OCR confuses with digits (`O`, `l`).
    fn glyph_quantity(&self, token: &Token) -> Option<Decimal> {
        if token.kind != TokenKind::Word || token.has_digit() || token.text.chars().count() > 2 {
            return None;
        }
        let corrected = correct_token_with(&token.text, CorrectionContext::Numeric, self.tables);
        if corrected == token.text || !corrected.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Decimal::from_str(&corrected).ok().filter(|q| *q <= self.config.max_quantity)
    }

    fn secondary_code(&self, token: &Token, mode: ExtractionMode) -> Option<String> {
        let len = token.text.chars().count();
        match token.kind {
            TokenKind::Word
                if len <= self.config.code2_max_len
                    && SECONDARY_CODE.is_match(&token.text)
                    && split_measure_with(&token.text, self.tables).is_none() =>
            {
                if mode.is_ocr() {
                    Some(correct_token_with(&token.text, CorrectionContext::Code, self.tables))
                } else {
                    Some(token.text.clone())
                }
            }
            // `$15` is an OCR reading of `S15`
            TokenKind::Currency
                if len < self.config.code2_max_len && token.text.chars().all(|c| c.is_ascii_digit()) =>
            {
                Some(format!("S{}", token.text))
            }
            _ => None,
        }
    }

    fn units_per_packet(
        &self,
        tokens: &[Token],
        used: &mut [bool],
        at: Option<usize>,
        raw: &str,
        notes: &mut Vec<LogEntry>,
    ) -> NonZeroU32 {
        let candidate = tokens.iter().enumerate().find(|(i, t)| {
            !used[*i]
                && t.kind == TokenKind::Paren
                && t.has_digit()
                && split_measure_with(&t.text, self.tables).is_none()
        });

        let Some((i, token)) = candidate else {
            notes.push(LogEntry::partial_field(at, raw, "units_per_packet", "1"));
            return NonZeroU32::MIN;
        };
        used[i] = true;

        let corrected = correct_token_with(&token.text, CorrectionContext::Numeric, self.tables);
        let units = PACK_COUNT
            .is_match(&corrected)
            .then(|| corrected.parse::<u32>().ok())
            .flatten()
            .and_then(NonZeroU32::new);

        match units {
            Some(units) => units,
            None => {
                notes.push(LogEntry::invalid_numeric(at, raw, "units_per_packet", &token.text));
                NonZeroU32::MIN
            }
        }
    }

    /// The unused run of anchor tokens with the most words in it, followed by
    /// the unused words of continuation fragments. Sizes are rendered canonically.
    fn text_run(&self, tokens: &[Token], used: &[bool], anchor_tokens: usize) -> Vec<TextWord> {
        let is_text = |i: usize| !used[i] && tokens[i].kind != TokenKind::Currency;

        let mut best = 0..0;
        let mut best_letters = 0;
        let mut start = 0;
        for end in 0..=anchor_tokens {
            if end < anchor_tokens && is_text(end) {
                continue;
            }
            let letters = tokens[start..end].iter().filter(|t| t.has_letter()).count();
            if letters > best_letters {
                best = start..end;
                best_letters = letters;
            }
            start = end + 1;
        }

        let mut run: Vec<Token> = tokens[best].to_vec();
        run.extend(
            (anchor_tokens..tokens.len())
                .filter(|&i| is_text(i))
                .map(|i| tokens[i].clone()),
        );

        let words = self.render(&run);
        let first_word = words
            .iter()
            .position(|w| w.text.chars().any(|c| c.is_alphabetic()))
            .unwrap_or(words.len());
        words.into_iter().skip(first_word).collect()
    }

    fn render(&self, run: &[Token]) -> Vec<TextWord> {
        let mut words = Vec::with_capacity(run.len());
        let mut k = 0;

        while k < run.len() {
            let token = &run[k];

            if let Some(measure) = split_measure_with(&token.text, self.tables) {
                let text = match token.kind {
                    TokenKind::Paren => format!("({})", measure),
                    _ => measure.to_string(),
                };
                words.push(TextWord { text, measure: Some(measure) });
                k += 1;
                continue;
            }

            // `14 oz`
            if let Some(next) = run.get(k + 1) {
                if token.kind == TokenKind::Word && next.kind == TokenKind::Word {
                    if let Ok(amount) = Decimal::from_str(&token.text) {
                        let unit = normalize_unit_with(&next.text, self.tables);
                        if unit != Unit::Unknown {
                            let measure = Measure { amount, unit };
                            words.push(TextWord { text: measure.to_string(), measure: Some(measure) });
                            k += 2;
                            continue;
                        }
                    }
                }
            }

            words.push(TextWord { text: token.display(), measure: None });
            k += 1;
        }

        words
    }

    /// Split descriptive words into brand, description and product.
    fn split_text(&self, words: &[String]) -> (String, String, String) {
        if words.is_empty() {
            return (String::new(), String::new(), String::new());
        }

        let brand_idx = words
            .iter()
            .position(|w| self.is_known_brand(w))
            .unwrap_or(0);
        let brand = words[brand_idx].clone();
        let product = words[brand_idx + 1..].join(" ");
        let description = self.description_of(&product);

        (brand, description, product)
    }

    fn is_known_brand(&self, word: &str) -> bool {
        let word = word.trim_end_matches(['.', ',']);
        self.config
            .known_brands
            .iter()
            .any(|b| b.eq_ignore_ascii_case(word))
    }

    fn description_of(&self, product: &str) -> String {
        for known in &self.config.known_descriptions {
            if known.is_empty() {
                continue;
            }
            if let Some(rest) = product.strip_prefix(known.as_str()) {
                if !rest.starts_with(|c: char| c.is_alphabetic()) {
                    return known.clone();
                }
            }
        }

        let first = product.split_whitespace().next().unwrap_or_default();
        match first.char_indices().find(|&(i, c)| {
            c == '.' && first[..i].ends_with(|p: char| p.is_alphabetic())
        }) {
            Some((i, _)) => first[..i].to_string(),
            None => first.to_string(),
        }
    }
}

/// A rendered word of the descriptive text.
#[derive(Debug, Clone)]
struct TextWord {
    text: String,
    measure: Option<Measure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract_with(config: &ExtractionConfig, text: &str, mode: ExtractionMode) -> (LineOutcome, RunLog) {
        let tables = RuleTables::default();
        let mut log = RunLog::new();
        let outcome =
            FieldExtractor::new(config, &tables).extract(&CandidateLine::detached(text), mode, &mut log);
        (outcome, log)
    }

    fn extract(text: &str) -> (InvoiceLineItem, RunLog) {
        let (outcome, log) = extract_with(&ExtractionConfig::default(), text, ExtractionMode::Ocr);
        match outcome {
            LineOutcome::Parsed(item) => (item, log),
            LineOutcome::Skipped(failure) => panic!("line skipped: {:?}", failure),
        }
    }

    #[test]
    fn test_extract_ocr_scenario_line() {
        let (item, log) = extract("12 1O CA5 (24) BRAND X Widget $3.5O $42.00");

        assert_eq!(item.purchased_qty, Decimal::from(12));
        assert_eq!(item.received_qty, Decimal::from(10));
        assert_eq!(item.code1, PrimaryCode::Cas);
        assert_eq!(item.code2, "");
        assert_eq!(item.units_per_packet.get(), 24);
        assert_eq!(item.brand, "BRAND");
        assert_eq!(item.description, "X");
        assert_eq!(item.product, "X Widget");
        assert_eq!(item.cost_per_packet, Decimal::new(350, 2));
        assert_eq!(item.total_cost, Decimal::new(4200, 2));
        assert_eq!(item.parse_confidence, ParseConfidence::High);
        assert_eq!(item.raw_text, "12 1O CA5 (24) BRAND X Widget $3.5O $42.00");
        assert!(log.is_empty());
    }

    #[test]
    fn test_extract_known_brand_description_and_measure() {
        let (item, log) = extract("2 2 PK HEM3O Hem Flo.Rice 14oz (10) $5.00 $10.00");

        assert_eq!(item.code1, PrimaryCode::Pk);
        assert_eq!(item.code2, "HEM30");
        assert_eq!(item.brand, "Hem");
        assert_eq!(item.description, "Flo");
        assert_eq!(item.product, "Flo.Rice 14oz");
        assert_eq!(item.measure, Some(Measure { amount: Decimal::from(14), unit: Unit::Oz }));
        assert_eq!(item.units_per_packet.get(), 10);
        assert_eq!(item.parse_confidence, ParseConfidence::High);
        assert!(log.is_empty());
    }

    #[test]
    fn test_native_mode_keeps_code2_verbatim() {
        let (outcome, _) = extract_with(
            &ExtractionConfig::default(),
            "2 2 PK HEM3O Hem Flo.Rice 14oz (10) $5.00 $10.00",
            ExtractionMode::Native,
        );
        assert_eq!(outcome.item().unwrap().code2, "HEM3O");
    }

    #[test]
    fn test_dollar_code2_and_multi_word_description() {
        let (item, _) = extract("1 1 CAS $15 Deep F S Samosa 12 pcs (12) $6.00 $6.00");

        assert_eq!(item.code2, "S15");
        assert_eq!(item.brand, "Deep");
        assert_eq!(item.description, "F S");
        assert_eq!(item.product, "F S Samosa 12pc");
        assert_eq!(item.measure, Some(Measure { amount: Decimal::from(12), unit: Unit::Pc }));
        assert_eq!(item.cost_per_packet, Decimal::new(600, 2));
        assert_eq!(item.units_per_packet.get(), 12);
    }

    #[test]
    fn test_unresolved_line_is_skipped_with_one_entry() {
        let (outcome, log) = extract_with(
            &ExtractionConfig::default(),
            "Thank you for shopping with us",
            ExtractionMode::Ocr,
        );

        assert_eq!(
            outcome,
            LineOutcome::Skipped(LineFailure {
                raw_text: "Thank you for shopping with us".to_string(),
                line_number: None,
                reason: FailureReason::Unresolved,
            })
        );
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].kind, LogKind::LineParseFailure);
        assert_eq!(log.entries()[0].raw_text.as_deref(), Some("Thank you for shopping with us"));
    }

    #[test]
    fn test_missing_fields_are_partial() {
        let (item, log) = extract("5 BAG Rice");

        assert_eq!(item.purchased_qty, Decimal::from(5));
        assert_eq!(item.received_qty, Decimal::from(5));
        assert_eq!(item.code1, PrimaryCode::Bag);
        assert_eq!(item.cost_per_packet, Decimal::ZERO);
        assert_eq!(item.total_cost, Decimal::ZERO);
        assert_eq!(item.units_per_packet.get(), 1);
        assert_eq!(item.brand, "Rice");
        assert_eq!(item.product, "");
        assert_eq!(item.parse_confidence, ParseConfidence::Partial);
        // received_qty, cost_per_packet, total_cost, units_per_packet
        assert_eq!(log.count(LogKind::PartialField), 4);
    }

    #[test]
    fn test_invalid_cost_and_units_are_logged() {
        let (item, log) = extract("3 3 PK (2x) Tea Chai $1.5 $4.50");

        assert_eq!(item.cost_per_packet, Decimal::ZERO);
        assert_eq!(item.total_cost, Decimal::new(450, 2));
        assert_eq!(item.units_per_packet.get(), 1);
        assert_eq!(item.parse_confidence, ParseConfidence::Partial);
        assert_eq!(log.count(LogKind::InvalidNumericFormat), 2);
        assert_eq!(log.count(LogKind::PartialField), 0);
    }

    #[test]
    fn test_quantities_above_limit_are_ignored() {
        let (item, log) = extract("150 150 CAS (1) Oil Tin $1.00 $150.00");

        assert_eq!(item.purchased_qty, Decimal::ZERO);
        assert_eq!(item.parse_confidence, ParseConfidence::Partial);
        assert_eq!(log.count(LogKind::PartialField), 1);
        assert_eq!(log.count(LogKind::TotalMismatch), 0);
    }

    #[test]
    fn test_total_mismatch_keeps_confidence() {
        let (item, log) = extract("2 2 PK (6) Hem Spi Mix $3.00 $7.00");

        assert_eq!(item.parse_confidence, ParseConfidence::High);
        assert_eq!(item.description, "Spi");
        assert_eq!(log.count(LogKind::TotalMismatch), 1);
    }

    #[test]
    fn test_unreadable_cost_keeps_its_position() {
        let (item, log) = extract("3 3 PK (2) Tea Chai $1.5 $4.50");

        assert_eq!(item.cost_per_packet, Decimal::ZERO);
        assert_eq!(item.total_cost, Decimal::new(450, 2));
        assert_eq!(item.units_per_packet.get(), 2);
        assert_eq!(item.parse_confidence, ParseConfidence::Partial);
        assert_eq!(log.count(LogKind::InvalidNumericFormat), 1);
        assert_eq!(log.count(LogKind::TotalMismatch), 0);

        let (item, log) = extract("3 3 PK (2) Tea Chai $1.50 $4.5");
        assert_eq!(item.cost_per_packet, Decimal::new(150, 2));
        assert_eq!(item.total_cost, Decimal::ZERO);
        assert_eq!(log.count(LogKind::InvalidNumericFormat), 1);
        assert_eq!(log.count(LogKind::PartialField), 0);
    }

    #[test]
    fn test_code_far_from_quantities_is_product_text() {
        let (item, log) = extract("2 2 XQZ (6) Hem Spi Mix GAS Stove $3.00 $6.00");

        assert_eq!(item.code1, PrimaryCode::Unknown);
        assert_eq!(item.brand, "Hem");
        assert_eq!(item.product, "Spi Mix GAS Stove");
        assert_eq!(item.cost_per_packet, Decimal::new(300, 2));
        assert_eq!(item.total_cost, Decimal::new(600, 2));
        assert_eq!(item.parse_confidence, ParseConfidence::Partial);
        assert_eq!(log.count(LogKind::PartialField), 1);
    }

    #[test]
    fn test_anchor_window_setting_moves_the_code_limit() {
        let config = ExtractionConfig::default();
        let tables = RuleTables::default();
        let line = CandidateLine::detached("2 2 Hem Spi CAS (6) $3.00 $6.00");

        let mut log = RunLog::new();
        let narrow = FieldExtractor::new(&config, &tables).with_anchor_window(1);
        let item = narrow.extract(&line, ExtractionMode::Ocr, &mut log);
        assert_eq!(item.item().unwrap().code1, PrimaryCode::Unknown);

        let mut log = RunLog::new();
        let wide = FieldExtractor::new(&config, &tables).with_anchor_window(3);
        let item = wide.extract(&line, ExtractionMode::Ocr, &mut log);
        assert_eq!(item.item().unwrap().code1, PrimaryCode::Cas);
        assert_eq!(item.item().unwrap().product, "Spi");
    }

    #[test]
    fn test_received_quantity_read_as_letter() {
        let (item, log) = extract("12 O CAS (24) Hem Flo Rice $3.50 $42.00");

        assert_eq!(item.purchased_qty, Decimal::from(12));
        assert_eq!(item.received_qty, Decimal::ZERO);
        assert_eq!(item.code1, PrimaryCode::Cas);
        assert_eq!(item.product, "Flo Rice");
        assert_eq!(item.parse_confidence, ParseConfidence::High);
        assert!(log.is_empty());

        let (item, _) = extract("4 l BAG (1) Dal $2.00 $8.00");
        assert_eq!(item.received_qty, Decimal::ONE);

        // Only the slot right after the purchased quantity
        let (item, _) = extract("4 BAG O Dal $2.00 $8.00");
        assert_eq!(item.received_qty, Decimal::from(4));
    }
}
