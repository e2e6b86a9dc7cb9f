//! Text sources: where invoice text comes from and how it was produced.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::PdfConfig;
use crate::models::line_item::ExtractionMode;
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Page separator in text produced by PDF-to-text and OCR tools.
const FORM_FEED: char = '\u{000C}';

/// All extracted text of one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    pub mode: ExtractionMode,
    pub file_name: Option<String>,
    pub page_count: Option<u32>,
}

impl SourceText {
    pub fn new(text: impl Into<String>, mode: ExtractionMode) -> Self {
        Self {
            text: text.into(),
            mode,
            file_name: None,
            page_count: None,
        }
    }

    /// Concatenate per-page text in page order, with a `=== Page N ===` line
    /// before every page after the first.
    pub fn from_pages<I, S>(pages: I, mode: ExtractionMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut count = 0u32;
        for page in pages {
            count += 1;
            if count > 1 {
                text.push_str(&format!("\n=== Page {} ===\n", count));
            }
            text.push_str(page.as_ref().trim_end());
        }
        Self {
            text,
            mode,
            file_name: None,
            page_count: Some(count),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// Something that can produce the text of one invoice.
pub trait TextSource {
    fn read(&self) -> Result<SourceText>;
}

/// Plain text file, e.g. OCR output.
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
    mode: ExtractionMode,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>, mode: ExtractionMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }
}

impl TextSource for TextFile {
    fn read(&self) -> Result<SourceText> {
        let text = std::fs::read_to_string(&self.path)?;
        let source = if text.contains(FORM_FEED) {
            SourceText::from_pages(text.split(FORM_FEED).filter(|p| !p.trim().is_empty()), self.mode)
        } else {
            SourceText::new(text, self.mode)
        };
        debug!(
            "Read {} bytes of {:?} text from {}",
            source.text.len(),
            self.mode,
            self.path.display()
        );
        Ok(with_file_name(source, &self.path))
    }
}

/// PDF with embedded text.
#[derive(Debug, Clone)]
pub struct PdfFile {
    path: PathBuf,
    config: PdfConfig,
}

impl PdfFile {
    pub fn new(path: impl Into<PathBuf>, config: PdfConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl TextSource for PdfFile {
    fn read(&self) -> Result<SourceText> {
        let data = std::fs::read(&self.path)?;
        let mut extractor = PdfExtractor::new(self.config.min_text_length);
        extractor.load(&data)?;
        let content = extractor.extract_all()?;

        info!(
            "Extracted {} chars of text from {} ({} pages)",
            content.text_len(),
            self.path.display(),
            content.page_count
        );

        let mut source = SourceText::from_pages(
            content.pages.iter().map(|p| p.text.as_str()),
            ExtractionMode::Native,
        );
        source.page_count = Some(content.page_count);
        Ok(with_file_name(source, &self.path))
    }
}

fn with_file_name(source: SourceText, path: &Path) -> SourceText {
    match path.file_name() {
        Some(name) => source.with_file_name(name.to_string_lossy()),
        None => source,
    }
}

/// Pick the text source for a path: PDFs by extension, everything else as text.
///
/// `mode` applies to text files only; PDF text is always native.
pub fn open_source(path: &Path, mode: ExtractionMode, pdf: &PdfConfig) -> Box<dyn TextSource + Send> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfFile::new(path, pdf.clone()))
    } else {
        Box::new(TextFile::new(path, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_pages_inserts_markers() {
        let source = SourceText::from_pages(["1 1 PK Tea\n", "2 2 BAG Dal"], ExtractionMode::Ocr);
        assert_eq!(source.text, "1 1 PK Tea\n=== Page 2 ===\n2 2 BAG Dal");
        assert_eq!(source.page_count, Some(2));
        assert_eq!(source.mode, ExtractionMode::Ocr);
    }

    #[test]
    fn test_text_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, "1 1 PK Tea\u{000C}2 2 BAG Dal\u{000C}").unwrap();

        let source = open_source(&path, ExtractionMode::Ocr, &PdfConfig::default())
            .read()
            .unwrap();

        assert_eq!(source.file_name.as_deref(), Some("scan.txt"));
        assert_eq!(source.page_count, Some(2));
        assert_eq!(source.text, "1 1 PK Tea\n=== Page 2 ===\n2 2 BAG Dal");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TextFile::new("/nonexistent/invoice.txt", ExtractionMode::Native).read();
        assert!(matches!(result, Err(crate::error::InvxError::Io(_))));
    }
}
