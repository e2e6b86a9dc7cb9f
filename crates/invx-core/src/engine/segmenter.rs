//! Splits a raw text block into candidate invoice lines.
//!
//! A new item starts at an anchor line: a quantity-like token and a
//! code-like token close to each other near the start of the line. Other
//! lines are continuation fragments of the previous item. A page marker
//! closes the current item: lines after it are page header until the next
//! anchor.

use std::str::Lines;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::error::EngineError;
use crate::models::config::InvxConfig;
use crate::rules::RuleTables;

use super::extractor::{paired_code, quantity_value};
use super::tokens::tokenize;

/// Text hypothesized to hold one invoice row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    /// Anchor line plus its continuation fragments, joined with single spaces.
    pub text: String,
    /// 1-based source line of the anchor.
    pub line_number: Option<usize>,
    /// Number of source lines merged into this candidate.
    pub fragments: usize,
    /// Byte length of the anchor line at the start of `text`.
    pub anchor_len: usize,
}

impl CandidateLine {
    /// A candidate built from a single string, without a source position.
    pub fn detached(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            anchor_len: text.len(),
            text,
            line_number: None,
            fragments: 1,
        }
    }

    fn anchored(text: &str, line_number: usize) -> Self {
        let text = text.trim().to_string();
        Self {
            anchor_len: text.len(),
            text,
            line_number: Some(line_number),
            fragments: 1,
        }
    }

    /// The anchor line without continuation fragments.
    pub fn anchor(&self) -> &str {
        &self.text[..self.anchor_len]
    }

    fn append(&mut self, fragment: &str) {
        self.text.push(' ');
        self.text.push_str(fragment.trim());
        self.fragments += 1;
    }
}

/// Anchor detection and line filtering rules.
#[derive(Debug, Clone, Copy)]
pub struct LineSegmenter<'a> {
    config: &'a InvxConfig,
    tables: &'a RuleTables,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> LineSegmenter<'a> {
    pub fn new(config: &'a InvxConfig, tables: &'a RuleTables) -> Self {
        Self {
            config,
            tables,
            cancel: None,
        }
    }

    /// Check `flag` periodically while reading lines.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Start segmenting `text`.
    ///
    /// Lines before the first anchor are dropped as preamble. Fails with
    /// [`EngineError::DocumentEmpty`] when there is no anchor at all.
    pub fn segment(self, text: &'a str) -> Result<CandidateLines<'a>, EngineError> {
        let mut lines = CandidateLines {
            segmenter: self,
            lines: text.lines(),
            lines_read: 0,
            pending: None,
            cancelled: false,
        };

        while let Some((number, line)) = lines.next_source_line() {
            if self.is_ignored(line) {
                continue;
            }
            if self.is_anchor(line) {
                debug!(line = number, "First invoice line found");
                lines.pending = Some(CandidateLine::anchored(line, number));
                return Ok(lines);
            }
            trace!(line = number, "Skipping preamble: {}", line);
        }

        if lines.cancelled {
            return Err(EngineError::Cancelled { items_emitted: 0 });
        }
        Err(EngineError::DocumentEmpty {
            lines_scanned: lines.lines_read,
        })
    }

    /// Blank lines, page separators, and header/footer lines.
    pub fn is_ignored(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let config = &self.config.segmentation;
        trimmed.is_empty()
            || self.is_page_marker(trimmed)
            || config
                .ignore_markers
                .iter()
                .any(|m| !m.is_empty() && trimmed.contains(m.as_str()))
    }

    /// Whether a line separates two pages.
    pub fn is_page_marker(&self, line: &str) -> bool {
        let marker = self.config.segmentation.page_marker.as_str();
        !marker.is_empty() && line.trim().starts_with(marker)
    }

    /// Whether a line starts a new invoice item.
    pub fn is_anchor(&self, line: &str) -> bool {
        let window = self.config.segmentation.anchor_window;
        let max_quantity = self.config.extraction.max_quantity;
        let tokens = tokenize(line);

        let quantities: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| quantity_value(t, max_quantity, self.tables).is_some())
            .map(|(i, _)| i)
            .collect();

        !quantities.is_empty() && paired_code(&tokens, &quantities, window, self.tables).is_some()
    }
}

/// Lazy sequence of candidate lines. Consumes its text once.
#[derive(Debug)]
pub struct CandidateLines<'a> {
    segmenter: LineSegmenter<'a>,
    lines: Lines<'a>,
    lines_read: usize,
    pending: Option<CandidateLine>,
    cancelled: bool,
}

impl<'a> CandidateLines<'a> {
    /// Whether iteration stopped because the cancellation flag was raised.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Source lines read so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    fn next_source_line(&mut self) -> Option<(usize, &'a str)> {
        if self.cancelled {
            return None;
        }
        let interval = self.segmenter.config.segmentation.cancel_check_interval.max(1);
        if let Some(flag) = self.segmenter.cancel {
            if self.lines_read % interval == 0 && flag.load(Ordering::Relaxed) {
                debug!(lines_read = self.lines_read, "Segmentation cancelled");
                self.cancelled = true;
                return None;
            }
        }
        let line = self.lines.next()?;
        self.lines_read += 1;
        Some((self.lines_read, line))
    }
}

impl Iterator for CandidateLines<'_> {
    type Item = CandidateLine;

    fn next(&mut self) -> Option<CandidateLine> {
        let mut current = self.pending.take()?;
        let mut page_break = false;

        while let Some((number, line)) = self.next_source_line() {
            if self.segmenter.is_page_marker(line) {
                trace!(line = number, "Page break closes line {:?}", current.line_number);
                page_break = true;
                continue;
            }
            if self.segmenter.is_ignored(line) {
                continue;
            }
            if self.segmenter.is_anchor(line) {
                self.pending = Some(CandidateLine::anchored(line, number));
                return Some(current);
            }
            if page_break {
                trace!(line = number, "Skipping page header: {}", line);
                continue;
            }
            trace!(line = number, "Continuation of line {:?}", current.line_number);
            current.append(line);
        }

        if self.cancelled {
            None
        } else {
            Some(current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segment(text: &str) -> Result<Vec<CandidateLine>, EngineError> {
        let config = InvxConfig::default();
        let tables = RuleTables::default();
        LineSegmenter::new(&config, &tables)
            .segment(text)
            .map(|lines| lines.collect())
    }

    #[test]
    fn test_segment_joins_continuation_lines() {
        let text = "ACME DISTRIBUTORS\nInvoice 4411\n\
                    12 10 CAS (24) BRAND X Widget $3.50 $42.00\n\
                    extra long description\n\
                    2 2 PK HEM33 Hem Flo $5.00 $10.00\n";
        let lines = segment(text).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].text,
            "12 10 CAS (24) BRAND X Widget $3.50 $42.00 extra long description"
        );
        assert_eq!(lines[0].line_number, Some(3));
        assert_eq!(lines[0].fragments, 2);
        assert_eq!(lines[0].anchor(), "12 10 CAS (24) BRAND X Widget $3.50 $42.00");
        assert_eq!(lines[1].text, "2 2 PK HEM33 Hem Flo $5.00 $10.00");
        assert_eq!(lines[1].line_number, Some(5));
    }

    #[test]
    fn test_segment_skips_markers_and_pages() {
        let text = "1 1 BAG Rice $2.00 $2.00\n=== Page 2 ===\nCONTINUED\n\
                    Suggested retail 4 PK\n3 3 CA5 Dal $1.00 $3.00";
        let lines = segment(text).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "1 1 BAG Rice $2.00 $2.00");
        assert_eq!(lines[1].text, "3 3 CA5 Dal $1.00 $3.00");
    }

    #[test]
    fn test_page_header_is_not_a_continuation() {
        let text = "ACME DISTRIBUTORS\nQty Qty Code Item Price Total\n\
                    1 1 PK Hem Tea (1) $1.00 $1.00\n\
                    Masala blend\n\
                    === Page 2 ===\n\
                    ACME DISTRIBUTORS\n\
                    Qty Qty Code Item Price Total\n\
                    2 2 BAG Dal (1) $1.00 $2.00\n\
                    Toor split\n";
        let lines = segment(text).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "1 1 PK Hem Tea (1) $1.00 $1.00 Masala blend");
        assert_eq!(lines[0].fragments, 2);
        assert_eq!(lines[1].text, "2 2 BAG Dal (1) $1.00 $2.00 Toor split");
        assert_eq!(lines[1].line_number, Some(8));
    }

    #[test]
    fn test_segment_without_anchor_is_document_empty() {
        assert_eq!(
            segment("").unwrap_err(),
            EngineError::DocumentEmpty { lines_scanned: 0 }
        );
        assert_eq!(
            segment("Thank you for your business\nTotal $42.00\n").unwrap_err(),
            EngineError::DocumentEmpty { lines_scanned: 2 }
        );
    }

    #[test]
    fn test_anchor_rules() {
        let config = InvxConfig::default();
        let tables = RuleTables::default();
        let segmenter = LineSegmenter::new(&config, &tables);

        assert!(segmenter.is_anchor("12 1O CA5 (24) BRAND X Widget $3.5O $42.00"));
        assert!(segmenter.is_anchor("CAS 4 Tea"));
        // quantity too far from the code
        assert!(!segmenter.is_anchor("Widget Deluxe Edition 12 CAS"));
        // sizes are not quantities
        assert!(!segmenter.is_anchor("14oz PK"));
        assert!(!segmenter.is_anchor("extra long description"));
        assert!(!segmenter.is_anchor("2 2 XQZ (6) Hem Spi Mix GAS Stove $3.00 $6.00"));
    }

    #[test]
    fn test_cancelled_segmentation_stops() {
        let config = InvxConfig::default();
        let tables = RuleTables::default();
        let flag = AtomicBool::new(true);

        let result = LineSegmenter::new(&config, &tables)
            .with_cancel(&flag)
            .segment("1 1 PK Tea $1.00 $1.00");
        assert_eq!(result.unwrap_err(), EngineError::Cancelled { items_emitted: 0 });

        let flag = AtomicBool::new(false);
        let mut lines = LineSegmenter::new(&config, &tables)
            .with_cancel(&flag)
            .segment("1 1 PK Tea $1.00 $1.00\n2 2 PK Dal $1.00 $2.00")
            .unwrap();
        assert!(lines.next().is_some());
        assert!(!lines.was_cancelled());
    }
}
