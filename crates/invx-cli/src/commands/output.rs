//! Table writer: CSV, JSON and plain text renderings of a converted invoice.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;

use invx_core::engine::round_currency;
use invx_core::{InvoiceDocument, InvoiceLineItem, RunLog};

/// Column headers of the line-item table.
pub const COLUMNS: [&str; 12] = [
    "Purchased",
    "Received",
    "Code1",
    "Code2",
    "Brand",
    "Description",
    "Product",
    "CostPerPacket",
    "TotalCost",
    "BarInParanthesis",
    "UnitCost",
    "Tentative",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Line-item table as CSV
    Csv,
    /// Document and run log as JSON
    Json,
    /// Plain text table
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    document: &'a InvoiceDocument,
    log: &'a RunLog,
}

/// Writes converted invoices in one output format.
#[derive(Clone, Copy, Debug)]
pub struct TableWriter {
    format: OutputFormat,
}

impl TableWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render(&self, document: &InvoiceDocument, log: &RunLog) -> anyhow::Result<String> {
        match self.format {
            OutputFormat::Csv => render_csv(document),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonReport { document, log })?),
            OutputFormat::Text => Ok(render_text(document)),
        }
    }

    pub fn write(&self, path: &Path, document: &InvoiceDocument, log: &RunLog) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render(document, log)?)?;
        Ok(())
    }

    /// `invoice_data_<YYYYmmdd_HHMMSS>.<ext>` next to the input file.
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        let name = format!(
            "invoice_data_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            self.format.extension()
        );
        input
            .parent()
            .map(|dir| dir.join(&name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Two decimals, half-up.
fn currency(value: Decimal) -> String {
    format!("{:.2}", round_currency(value))
}

fn row(item: &InvoiceLineItem) -> [String; 12] {
    [
        item.purchased_qty.normalize().to_string(),
        item.received_qty.normalize().to_string(),
        item.code1.to_string(),
        item.code2.clone(),
        item.brand.clone(),
        item.description.clone(),
        item.product.clone(),
        currency(item.cost_per_packet),
        currency(item.total_cost),
        item.units_per_packet.to_string(),
        currency(item.unit_cost),
        currency(item.tentative_price),
    ]
}

fn render_csv(document: &InvoiceDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(COLUMNS)?;
    for item in &document.items {
        wtr.write_record(row(item))?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn render_text(document: &InvoiceDocument) -> String {
    let rows: Vec<[String; 12]> = document.items.iter().map(row).collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    if let Some(name) = &document.source.file_name {
        output.push_str(&format!("Invoice: {}\n\n", name));
    }

    output.push_str(&pad_row(COLUMNS.iter().copied(), &widths));
    output.push('\n');
    for r in &rows {
        output.push_str(&pad_row(r.iter().map(String::as_str), &widths));
        output.push('\n');
    }

    let counts = document.confidence_counts();
    output.push_str(&format!(
        "\n{} items ({} high, {} partial), total cost {}\n",
        document.item_count(),
        counts.high,
        counts.partial,
        currency(document.total_cost_sum())
    ));
    output
}
