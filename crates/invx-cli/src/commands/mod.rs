//! Subcommands and the pieces they share.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;
pub mod worker;

use invx_core::ExtractionMode;

/// How the text of a plain text input was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    /// Embedded PDF text, corrections only where needed
    Native,
    /// OCR output, always corrected
    Ocr,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Native => ExtractionMode::Native,
            ModeArg::Ocr => ExtractionMode::Ocr,
        }
    }
}

/// Input files the pipeline can read.
pub fn is_supported_input(path: &std::path::Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
}
