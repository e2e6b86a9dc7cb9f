//! Background worker running the text source and the engine off the async runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::debug;

use invx_core::{open_source, Engine, ExtractionMode, InvoiceDocument, LogEntry, RunLog, Severity};

/// Messages sent from the worker to the interactive side.
///
/// Progress is reported per stage, not per line: the engine runs as one
/// blocking call, so its run log entries are sent in one burst after it
/// returns, in log order, before `Finished`.
#[derive(Debug, Clone)]
pub enum Progress {
    Reading(PathBuf),
    Extracting { chars: usize, pages: Option<u32> },
    /// A run log entry, replayed once extraction is over.
    Log(LogEntry),
    Finished { items: usize },
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct Job {
    pub log: RunLog,
    pub result: invx_core::Result<InvoiceDocument>,
}

impl Job {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.result,
            Err(invx_core::InvxError::Engine(invx_core::EngineError::Cancelled { .. }))
        )
    }
}

/// Read `path` and convert it on a blocking thread, reporting over `tx`.
fn run_job(
    path: PathBuf,
    mode: ExtractionMode,
    engine: Arc<Engine>,
    cancel: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Progress>,
) -> Job {
    let mut log = RunLog::new();
    // The receiver may be gone; progress is best effort.
    let _ = tx.send(Progress::Reading(path.clone()));

    let source = match open_source(&path, mode, &engine.config().pdf).read() {
        Ok(source) => source,
        Err(e) => return Job { log, result: Err(e) },
    };
    let _ = tx.send(Progress::Extracting {
        chars: source.text.len(),
        pages: source.page_count,
    });

    let result = engine
        .run_with_cancel(&source, &mut log, &cancel)
        .map_err(invx_core::InvxError::from);

    for entry in &log {
        let _ = tx.send(Progress::Log(entry.clone()));
    }
    if let Ok(document) = &result {
        let _ = tx.send(Progress::Finished {
            items: document.item_count(),
        });
    }

    Job { log, result }
}

pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run the pipeline for one file on a blocking worker.
///
/// Progress goes to `pb`; run log entries are printed above it when
/// `show_log` is set. Ctrl-C raises the engine's cancel flag.
pub async fn process_file(
    path: &Path,
    mode: ExtractionMode,
    engine: Arc<Engine>,
    pb: &ProgressBar,
    show_log: bool,
) -> anyhow::Result<Job> {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let interrupt = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        })
    };

    let handle = {
        let path = path.to_path_buf();
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || run_job(path, mode, engine, cancel, tx))
    };

    while let Some(message) = rx.recv().await {
        match message {
            Progress::Reading(path) => pb.set_message(format!("Reading {}...", path.display())),
            Progress::Extracting { chars, pages } => {
                debug!("Source text: {} chars, {:?} pages", chars, pages);
                pb.set_message(format!("Extracting line items from {} chars...", chars));
            }
            Progress::Log(entry) => {
                if show_log {
                    pb.println(format_entry(&entry));
                }
            }
            Progress::Finished { items } => pb.set_message(format!("Extracted {} items", items)),
        }
    }

    let job = handle.await;
    interrupt.abort();
    Ok(job?)
}

/// One run log entry as a single display line.
pub fn format_entry(entry: &LogEntry) -> String {
    let tag = match entry.severity {
        Severity::Info => style("info").blue(),
        Severity::Warning => style("warn").yellow(),
        Severity::Error => style("error").red(),
    };
    let location = entry
        .line
        .map(|line| format!("line {}: ", line))
        .unwrap_or_default();
    match &entry.raw_text {
        Some(raw) => format!("{} {}{} | {}", tag, location, entry.message, style(raw).dim()),
        None => format!("{} {}{}", tag, location, entry.message),
    }
}
