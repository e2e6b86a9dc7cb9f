//! Token-level regex patterns for invoice rows.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Integer or decimal quantity: 12, 1.5
    pub static ref QUANTITY: Regex = Regex::new(r"^\d+(?:\.\d+)?$").unwrap();

    // Currency amount with exactly two fraction digits, optional thousands separators
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}$").unwrap();

    // Count inside parentheses: (24)
    pub static ref PACK_COUNT: Regex = Regex::new(r"^\d+$").unwrap();

    // Secondary product code after the primary code: S15, HEM33, I5P, Q93
    pub static ref SECONDARY_CODE: Regex = Regex::new(r"^[A-Za-z0-9]*\d[A-Za-z0-9]*$").unwrap();
}
