//! Invoice line extraction engine.
//!
//! Text goes through the [`LineSegmenter`], each candidate line through the
//! [`FieldExtractor`], and each parsed record through the derived field
//! calculation. The engine holds no per-run state: running it twice on the
//! same text gives the same document.

pub mod derived;
pub mod extractor;
pub mod log;
pub mod segmenter;
pub mod tokens;

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::EngineError;
use crate::models::config::InvxConfig;
use crate::models::line_item::{ExtractionMode, InvoiceDocument, SourceInfo};
use crate::rules::RuleTables;
use crate::source::SourceText;

pub use derived::{apply_derived, compute_derived, round_currency, DerivedFields};
pub use extractor::{FailureReason, FieldExtractor, LineFailure, LineOutcome};
pub use log::{LogEntry, LogKind, RunLog, Severity};
pub use segmenter::{CandidateLine, CandidateLines, LineSegmenter};

/// Converts invoice text into line items.
#[derive(Debug, Clone)]
pub struct Engine {
    config: InvxConfig,
    tables: RuleTables,
}

impl Engine {
    /// Create an engine, merging configured rule entries over the built-in tables.
    pub fn new(config: InvxConfig) -> Self {
        let tables = RuleTables::from_config(&config.rules);
        Self { config, tables }
    }

    pub fn config(&self) -> &InvxConfig {
        &self.config
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Convert one document.
    ///
    /// Anomalies in single lines end up in `log`; only a document without any
    /// invoice line fails.
    pub fn run(&self, source: &SourceText, log: &mut RunLog) -> Result<InvoiceDocument, EngineError> {
        self.run_inner(source, log, None)
    }

    /// Like [`Engine::run`], stopping with [`EngineError::Cancelled`] once
    /// `cancel` is raised.
    pub fn run_with_cancel(
        &self,
        source: &SourceText,
        log: &mut RunLog,
        cancel: &AtomicBool,
    ) -> Result<InvoiceDocument, EngineError> {
        self.run_inner(source, log, Some(cancel))
    }

    /// Extract a single line, derived fields included.
    pub fn extract_line(&self, line: &str, mode: ExtractionMode, log: &mut RunLog) -> LineOutcome {
        let candidate = CandidateLine::detached(line);
        match self.extractor().extract(&candidate, mode, log) {
            LineOutcome::Parsed(item) => LineOutcome::Parsed(apply_derived(item, &self.config.pricing)),
            skipped => skipped,
        }
    }

    fn extractor(&self) -> FieldExtractor<'_> {
        FieldExtractor::new(&self.config.extraction, &self.tables)
            .with_anchor_window(self.config.segmentation.anchor_window)
    }

    fn run_inner(
        &self,
        source: &SourceText,
        log: &mut RunLog,
        cancel: Option<&AtomicBool>,
    ) -> Result<InvoiceDocument, EngineError> {
        let start = Instant::now();

        let mut segmenter = LineSegmenter::new(&self.config, &self.tables);
        if let Some(flag) = cancel {
            segmenter = segmenter.with_cancel(flag);
        }

        let mut candidates = match segmenter.segment(&source.text) {
            Ok(candidates) => candidates,
            Err(EngineError::DocumentEmpty { lines_scanned }) => {
                log.push(LogEntry::document_empty(lines_scanned));
                return Err(EngineError::DocumentEmpty { lines_scanned });
            }
            Err(e) => return Err(e),
        };

        let extractor = self.extractor();
        let mut items = Vec::new();
        let mut skipped = 0;

        for candidate in candidates.by_ref() {
            debug!(line = candidate.line_number.unwrap_or(0), "Candidate: {}", candidate.text);
            match extractor.extract(&candidate, source.mode, log) {
                LineOutcome::Parsed(item) => items.push(apply_derived(item, &self.config.pricing)),
                LineOutcome::Skipped(_) => skipped += 1,
            }
        }

        if candidates.was_cancelled() {
            return Err(EngineError::Cancelled {
                items_emitted: items.len(),
            });
        }

        let document = InvoiceDocument {
            source: SourceInfo {
                file_name: source.file_name.clone(),
                mode: source.mode,
                page_count: source.page_count,
            },
            items,
        };

        let counts = document.confidence_counts();
        info!(
            "Extracted {} items ({} high, {} partial, {} skipped) from {} lines in {:?}",
            document.item_count(),
            counts.high,
            counts.partial,
            skipped,
            candidates.lines_read(),
            start.elapsed()
        );

        Ok(document)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(InvxConfig::default())
    }
}
