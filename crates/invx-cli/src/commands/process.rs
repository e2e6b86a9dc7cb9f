//! Process command - convert a single invoice file into a line-item table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invx_core::{Engine, EngineError, InvxError, LogKind};

use super::ModeArg;
use super::config::load_config;
use super::output::{OutputFormat, TableWriter};
use super::worker::{format_entry, process_file, spinner};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or OCR text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file, `-` for stdout (default: invoice_data_<timestamp>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// How the text of a .txt input was produced
    #[arg(long, value_enum, default_value = "ocr")]
    mode: ModeArg,

    /// Print every run log entry
    #[arg(long)]
    show_log: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !super::is_supported_input(&args.input) {
        anyhow::bail!(
            "Unsupported file format: {} (expected .pdf or .txt)",
            args.input.display()
        );
    }

    info!("Processing file: {}", args.input.display());

    let engine = Arc::new(Engine::new(config));
    let pb = spinner();
    let job = process_file(&args.input, args.mode.into(), engine, &pb, args.show_log).await?;
    pb.finish_and_clear();

    let document = match job.result {
        Ok(document) => document,
        Err(InvxError::Engine(EngineError::DocumentEmpty { lines_scanned })) => {
            for entry in &job.log {
                eprintln!("{}", format_entry(entry));
            }
            anyhow::bail!(
                "No invoice line items found in {} ({} lines scanned)",
                args.input.display(),
                lines_scanned
            );
        }
        Err(InvxError::Engine(EngineError::Cancelled { items_emitted })) => {
            anyhow::bail!("Cancelled after {} items, nothing written", items_emitted);
        }
        Err(e) => return Err(e.into()),
    };

    let writer = TableWriter::new(args.format);
    let to_stdout = args.output.as_deref().is_some_and(|p| p.as_os_str() == "-");

    if to_stdout {
        print!("{}", writer.render(&document, &job.log)?);
    } else {
        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| writer.default_output_path(&args.input));
        writer.write(&output_path, &document, &job.log)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    }

    let counts = document.confidence_counts();
    eprintln!(
        "{} {} items ({} high, {} partial), {} lines skipped",
        style("ℹ").blue(),
        document.item_count(),
        counts.high,
        counts.partial,
        job.log.count(LogKind::LineParseFailure)
    );
    if !args.show_log && !job.log.is_empty() {
        eprintln!(
            "{} {} run log entries, use --show-log to list them",
            style("ℹ").blue(),
            job.log.len()
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
