//! Run log: one structured entry per anomaly met while converting a document.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// No invoice line was found in the whole document.
    DocumentEmpty,
    /// A candidate line was dropped.
    LineParseFailure,
    /// A field fell back to its default.
    PartialField,
    /// A token expected to be numeric stayed non-numeric after correction.
    InvalidNumericFormat,
    /// Total cost does not match cost per packet times a quantity.
    TotalMismatch,
}

/// One run log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub kind: LogKind,
    /// 1-based source line where the candidate line starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    /// Candidate line text, verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl LogEntry {
    pub fn document_empty(lines_scanned: usize) -> Self {
        Self {
            severity: Severity::Error,
            kind: LogKind::DocumentEmpty,
            line: None,
            message: format!(
                "No invoice line found in {} source lines; the text extraction probably failed",
                lines_scanned
            ),
            raw_text: None,
        }
    }

    pub fn line_failure(line: Option<usize>, raw_text: &str, reason: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind: LogKind::LineParseFailure,
            line,
            message: reason.into(),
            raw_text: Some(raw_text.to_string()),
        }
    }

    pub fn partial_field(line: Option<usize>, raw_text: &str, field: &str, fallback: &str) -> Self {
        Self {
            severity: Severity::Warning,
            kind: LogKind::PartialField,
            line,
            message: format!("{} not found, using {}", field, fallback),
            raw_text: Some(raw_text.to_string()),
        }
    }

    pub fn invalid_numeric(line: Option<usize>, raw_text: &str, field: &str, token: &str) -> Self {
        Self {
            severity: Severity::Warning,
            kind: LogKind::InvalidNumericFormat,
            line,
            message: format!("{}: {:?} is not a number after correction", field, token),
            raw_text: Some(raw_text.to_string()),
        }
    }

    pub fn total_mismatch(line: Option<usize>, raw_text: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind: LogKind::TotalMismatch,
            line,
            message: message.into(),
            raw_text: Some(raw_text.to_string()),
        }
    }
}

/// Ordered run log of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and mirror it to `tracing`.
    pub fn push(&mut self, entry: LogEntry) {
        let line = entry.line.unwrap_or(0);
        match entry.severity {
            Severity::Info => info!(line, kind = ?entry.kind, "{}", entry.message),
            Severity::Warning => warn!(line, kind = ?entry.kind, "{}", entry.message),
            Severity::Error => error!(line, kind = ?entry.kind, "{}", entry.message),
        }
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }
}

impl<'a> IntoIterator for &'a RunLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_counts() {
        let mut log = RunLog::new();
        log.push(LogEntry::partial_field(Some(3), "12 CAS", "units_per_packet", "1"));
        log.push(LogEntry::line_failure(Some(4), "Thank you", "no quantity, code or cost"));
        log.push(LogEntry::partial_field(Some(5), "1 PK", "total_cost", "0"));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(LogKind::PartialField), 2);
        assert_eq!(log.count(LogKind::LineParseFailure), 1);
        assert!(log.has_errors());
        assert_eq!(log.entries()[1].raw_text.as_deref(), Some("Thank you"));
    }

    #[test]
    fn test_log_entry_json() {
        let entry = LogEntry::document_empty(7);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["kind"], "document_empty");
        assert!(json.get("raw_text").is_none());
    }
}
