//! Property-based tests for the normalizers and the engine.

use invx_core::engine::{round_currency, LineOutcome};
use invx_core::rules::{correct_token, normalize_unit, resolve_code, CorrectionContext};
use invx_core::{Engine, ExtractionMode, PrimaryCode, RunLog, SourceText, Unit};
use proptest::prelude::*;
use rust_decimal::Decimal;
use strsim::levenshtein;

// ── Strategies ──────────────────────────────────────────────────────────────

/// A unit spelling with random case and trailing punctuation.
fn arb_unit_variant() -> impl Strategy<Value = (String, Unit)> {
    let spellings = prop_oneof![
        Just(("oz", Unit::Oz)),
        Just(("ozs", Unit::Oz)),
        Just(("ounces", Unit::Oz)),
        Just(("lb", Unit::Lb)),
        Just(("lbs", Unit::Lb)),
        Just(("pound", Unit::Lb)),
        Just(("pc", Unit::Pc)),
        Just(("pcs", Unit::Pc)),
        Just(("pieces", Unit::Pc)),
    ];
    let suffix = prop_oneof![Just(""), Just("."), Just(","), Just(";"), Just("..")];

    (spellings, prop::collection::vec(any::<bool>(), 6), suffix).prop_map(|((word, unit), upper, suffix)| {
        let cased: String = word
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c })
            .collect();
        (format!("{}{}", cased, suffix), unit)
    })
}

/// A canonical code with one random edit applied.
fn arb_code_edit() -> impl Strategy<Value = String> {
    let code = prop_oneof![Just("CAS"), Just("PK"), Just("BAG")];
    let glyph = prop::sample::select(vec!['A', 'B', 'C', 'G', 'K', 'P', 'S', '5', '8', '0', 'X']);

    (code, 0usize..4, glyph, 0u8..3).prop_map(|(code, pos, glyph, op)| {
        let mut chars: Vec<char> = code.chars().collect();
        let pos = pos.min(chars.len());
        match op {
            0 if pos < chars.len() => chars[pos] = glyph,
            1 => chars.insert(pos, glyph),
            _ if pos < chars.len() && chars.len() > 1 => {
                chars.remove(pos);
            }
            _ => {}
        }
        chars.into_iter().collect()
    })
}

/// A well-formed invoice row and the values it was built from.
#[derive(Debug, Clone)]
struct Row {
    text: String,
    purchased: u32,
    received: u32,
    units: u32,
    cost_cents: u64,
}

fn arb_row() -> impl Strategy<Value = Row> {
    let code = prop_oneof![Just("CAS"), Just("CA5"), Just("PK"), Just("BAG"), Just("8AG")];
    let brand = prop_oneof![Just("Deep"), Just("Hem"), Just("BRAND"), Just("Acme")];

    (0u32..=100, 0u32..=100, code, 1u32..=48, brand, "[A-Z][a-z]{2,8}", 1u64..100_000, 1u64..1_000_000)
        .prop_map(|(purchased, received, code, units, brand, word, cost, total)| Row {
            text: format!(
                "{} {} {} ({}) {} {} ${}.{:02} ${}.{:02}",
                purchased,
                received,
                code,
                units,
                brand,
                word,
                cost / 100,
                cost % 100,
                total / 100,
                total % 100
            ),
            purchased,
            received,
            units,
            cost_cents: cost,
        })
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// NUMERIC correction yields only number glyphs, or leaves the token alone.
    #[test]
    fn numeric_correction_is_closed_and_idempotent(token in "[ -~]{0,12}") {
        let once = correct_token(&token, CorrectionContext::Numeric);
        let numeric = !once.is_empty()
            && once.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-');

        prop_assert!(numeric || once == token, "{:?} -> {:?}", token, once);
        prop_assert_eq!(correct_token(&once, CorrectionContext::Numeric), once);
    }

    /// CODE and ALPHA corrections are idempotent as well.
    #[test]
    fn code_and_alpha_corrections_are_idempotent(token in "[A-Za-z0-9|.]{0,10}") {
        for ctx in [CorrectionContext::Code, CorrectionContext::Alpha] {
            let once = correct_token(&token, ctx);
            prop_assert_eq!(correct_token(&once, ctx), once.clone());
        }
    }

    /// Noisy spellings of a unit normalize to the canonical token.
    #[test]
    fn unit_variants_normalize((variant, unit) in arb_unit_variant()) {
        prop_assert_eq!(normalize_unit(&variant), unit);
        prop_assert_eq!(normalize_unit(unit.suffix()), unit);
        prop_assert_eq!(normalize_unit(unit.as_str()), unit);
    }

    /// A token within distance 1 of exactly one code resolves to it; a tie is UNKNOWN.
    #[test]
    fn single_edits_resolve_unless_tied(token in arb_code_edit()) {
        let near: Vec<PrimaryCode> = PrimaryCode::CANONICAL
            .into_iter()
            .filter(|c| levenshtein(&token, c.as_str()) <= 1)
            .collect();

        let resolved = resolve_code(&token);
        match near.as_slice() {
            [only] => prop_assert_eq!(resolved, *only),
            [] => prop_assert_eq!(resolved, PrimaryCode::Unknown),
            _ => prop_assert_eq!(resolved, PrimaryCode::Unknown),
        }
    }

    /// Arbitrary short tokens never resolve to a code further than one edit away.
    #[test]
    fn resolved_codes_are_near(token in "[A-Z0-9]{1,4}") {
        let resolved = resolve_code(&token);
        if resolved.is_known() {
            prop_assert!(levenshtein(&token, resolved.as_str()) <= 1);
        }
    }

    /// Well-formed rows parse fully and the derived fields follow the formula.
    #[test]
    fn well_formed_rows_parse(row in arb_row()) {
        let engine = Engine::default();
        let mut log = RunLog::new();

        let outcome = engine.extract_line(&row.text, ExtractionMode::Ocr, &mut log);
        let item = match outcome {
            LineOutcome::Parsed(item) => item,
            LineOutcome::Skipped(failure) => return Err(TestCaseError::fail(format!("{:?}", failure))),
        };

        prop_assert!(item.code1.is_known());
        prop_assert_eq!(item.purchased_qty, Decimal::from(row.purchased));
        prop_assert_eq!(item.received_qty, Decimal::from(row.received));
        prop_assert_eq!(item.units_per_packet.get(), row.units);
        prop_assert_eq!(item.cost_per_packet, Decimal::new(row.cost_cents as i64, 2));
        prop_assert_eq!(
            item.unit_cost,
            round_currency(item.cost_per_packet / Decimal::from(item.units_per_packet.get()))
        );
        prop_assert!(item.unit_cost >= Decimal::ZERO);
        prop_assert!(item.tentative_price >= Decimal::ZERO);
        prop_assert_eq!(&item.raw_text, &row.text);
    }

    /// Lines without quantities, codes or costs are dropped with one log entry.
    #[test]
    fn wordy_lines_are_skipped_once(line in "[a-z]{2,8}( [a-z]{2,8}){0,5}") {
        let engine = Engine::default();
        let mut log = RunLog::new();

        let outcome = engine.extract_line(&line, ExtractionMode::Native, &mut log);

        prop_assert!(!outcome.is_parsed());
        prop_assert_eq!(log.len(), 1);
        prop_assert_eq!(log.entries()[0].raw_text.as_deref(), Some(line.as_str()));
    }

    /// Extraction never panics and every record has at least one unit per packet.
    #[test]
    fn arbitrary_lines_never_panic(line in "[ -~]{0,60}") {
        let engine = Engine::default();
        let mut log = RunLog::new();

        match engine.extract_line(&line, ExtractionMode::Ocr, &mut log) {
            LineOutcome::Parsed(item) => prop_assert!(item.units_per_packet.get() >= 1),
            LineOutcome::Skipped(failure) => {
                prop_assert_eq!(log.len(), 1);
                prop_assert_eq!(failure.raw_text, line);
            }
        }
    }

    /// Running the engine twice on the same text gives identical output.
    #[test]
    fn engine_runs_are_deterministic(rows in prop::collection::vec(arb_row(), 0..8), noise in "[a-z ]{0,20}") {
        let mut text = String::from("ACME SUPPLY\n");
        for row in &rows {
            text.push_str(&row.text);
            text.push('\n');
            text.push_str(&noise);
            text.push('\n');
        }
        let engine = Engine::default();
        let source = SourceText::new(text, ExtractionMode::Ocr);

        let mut first_log = RunLog::new();
        let first = engine.run(&source, &mut first_log);
        let mut second_log = RunLog::new();
        let second = engine.run(&source, &mut second_log);

        prop_assert_eq!(first_log, second_log);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.item_count(), rows.len());
                prop_assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
            }
            (Err(a), Err(b)) => {
                prop_assert!(rows.is_empty());
                prop_assert_eq!(a, b);
            }
            (a, b) => prop_assert!(false, "runs disagree: {:?} / {:?}", a.is_ok(), b.is_ok()),
        }
    }
}
