//! Rule-based normalizers for noisy invoice tokens.
//!
//! Every function here is pure: the same token and tables always give the
//! same result, so they can be reused across lines without synchronization.

pub mod codes;
pub mod corrector;
pub mod patterns;
pub mod tables;
pub mod units;

pub use codes::{resolve_code, resolve_code_with};
pub use corrector::{correct_token, correct_token_with, CorrectionContext};
pub use tables::RuleTables;
pub use units::{normalize_unit, normalize_unit_with, split_measure, split_measure_with};
