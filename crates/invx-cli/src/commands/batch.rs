//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use invx_core::{Engine, InvoiceDocument, LogKind, RunLog};

use super::ModeArg;
use super::config::load_config;
use super::output::{OutputFormat, TableWriter};
use super::worker::process_file;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input files
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// How the text of .txt inputs was produced
    #[arg(long, value_enum, default_value = "ocr")]
    mode: ModeArg,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// One row of summary.csv.
#[derive(Debug, Serialize)]
struct SummaryRow {
    file: String,
    status: &'static str,
    items: usize,
    partial: usize,
    skipped: usize,
    error: String,
}

impl SummaryRow {
    fn converted(path: &Path, document: &InvoiceDocument, log: &RunLog) -> Self {
        Self {
            file: path.display().to_string(),
            status: "ok",
            items: document.item_count(),
            partial: document.confidence_counts().partial,
            skipped: log.count(LogKind::LineParseFailure),
            error: String::new(),
        }
    }

    fn failed(path: &Path, log: &RunLog, error: String) -> Self {
        Self {
            file: path.display().to_string(),
            status: "failed",
            items: 0,
            partial: 0,
            skipped: log.count(LogKind::LineParseFailure),
            error,
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| super::is_supported_input(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let engine = Arc::new(Engine::new(config));
    let writer = TableWriter::new(args.format);
    let mut rows = Vec::with_capacity(files.len());

    for path in &files {
        overall_pb.set_message(path.display().to_string());
        let file_start = Instant::now();

        let job = process_file(path, args.mode.into(), Arc::clone(&engine), &overall_pb, false).await?;
        if job.is_cancelled() {
            overall_pb.abandon();
            anyhow::bail!("Cancelled while processing {}", path.display());
        }

        let row = match &job.result {
            Ok(document) => {
                let output_path = output_path_for(path, args.output_dir.as_deref(), writer.format());
                writer.write(&output_path, document, &job.log)?;
                debug!(
                    "{} -> {} in {:?}",
                    path.display(),
                    output_path.display(),
                    file_start.elapsed()
                );
                SummaryRow::converted(path, document, &job.log)
            }
            Err(e) => {
                if !args.continue_on_error {
                    overall_pb.abandon();
                    anyhow::bail!("Failed to process {}: {}", path.display(), e);
                }
                warn!("Failed to process {}: {}", path.display(), e);
                SummaryRow::failed(path, &job.log, e.to_string())
            }
        };
        rows.push(row);
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Done");

    if args.summary {
        let summary_path = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("summary.csv");
        write_summary(&summary_path, &rows)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = rows.iter().filter(|r| r.status == "failed").count();
    let items: usize = rows.iter().map(|r| r.items).sum();
    eprintln!(
        "{} Processed {} files ({} failed), {} line items in {:.1}s",
        if failed == 0 { style("✓").green() } else { style("!").yellow() },
        rows.len(),
        failed,
        items,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// `<stem>_invoice_data.<ext>` in `output_dir`, or next to the input.
fn output_path_for(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice".to_string());
    let name = format!("{}_invoice_data.{}", stem, format.extension());
    match output_dir.or_else(|| input.parent()) {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn write_summary(path: &Path, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
