// src/report.rs
// =============================================================================
// The one place status lines are written.
//
// Probe and download workers run on many threads at once. If each of them
// printed directly, two lines could be torn into each other. Instead every
// worker holds an Arc<Reporter>, and the Reporter formats a whole record and
// writes it while holding its mutex.
//
// Two output formats:
// - Text: one human-readable line per record (the default)
// - Json: one JSON object per line, handy for piping into jq
//
// Diagnostics meant for debugging go through `tracing` instead (see
// src/logging.rs); this file is only the user-facing record stream.
// =============================================================================

use crate::download::{DownloadOutcome, DownloadStatus};
use crate::probe::{ProbeResult, ProbeStatus};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// How records are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Phase boundaries of a run, reported once each
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Phase {
    /// Enumeration is about to fan out over `ids` identifiers
    EnumerationStarted { ids: u64 },
    /// Enumeration drained without a single matching link
    NoLinksFound,
    /// Enumeration drained; `links` distinct links go to the downloader
    DownloadsStarted { links: usize },
    /// Every download has finished, successfully or not
    Completed { download_dir: String },
}

// Wrapper giving every JSON line a "kind" field
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Probe(&'a ProbeResult),
    Download(&'a DownloadOutcome),
    Phase(&'a Phase),
}

/// Serialized, line-oriented status output shared by all workers
pub struct Reporter {
    format: ReportFormat,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    pub fn new(format: ReportFormat, sink: Box<dyn Write + Send>) -> Self {
        Self {
            format,
            sink: Mutex::new(sink),
        }
    }

    /// Reporter writing to the process's stdout
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(format, Box::new(io::stdout()))
    }

    pub fn probe(&self, result: &ProbeResult) {
        let line = match self.format {
            ReportFormat::Text => probe_line(result),
            ReportFormat::Json => json_line(&Record::Probe(result)),
        };
        self.emit(&line);
    }

    pub fn download(&self, outcome: &DownloadOutcome) {
        let line = match self.format {
            ReportFormat::Text => download_line(outcome),
            ReportFormat::Json => json_line(&Record::Download(outcome)),
        };
        self.emit(&line);
    }

    pub fn phase(&self, phase: &Phase) {
        let line = match self.format {
            ReportFormat::Text => phase_line(phase),
            ReportFormat::Json => json_line(&Record::Phase(phase)),
        };
        self.emit(&line);
    }

    // The line is fully formatted before the lock is taken, so the critical
    // section is a single write + flush.
    fn emit(&self, line: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let result = writeln!(sink, "{}", line).and_then(|_| sink.flush());
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed to write status line");
        }
    }
}

fn probe_line(result: &ProbeResult) -> String {
    match &result.status {
        ProbeStatus::Success { links } => {
            format!("UID {}: {} link(s) found", result.id, links.len())
        }
        ProbeStatus::HttpError { code } => format!("UID {}: HTTP {}", result.id, code),
        ProbeStatus::TransportError { message } => {
            format!("UID {}: Error accessing URL: {}", result.id, message)
        }
    }
}

fn download_line(outcome: &DownloadOutcome) -> String {
    match &outcome.status {
        DownloadStatus::Saved { path } => {
            format!("Downloaded: {} -> {}", outcome.url, path.display())
        }
        DownloadStatus::HttpError { code } => {
            format!("Failed to download: {} | HTTP Status: {}", outcome.url, code)
        }
        DownloadStatus::TransportError { message } => {
            format!("Failed to download: {} | Error: {}", outcome.url, message)
        }
        DownloadStatus::WriteError { message } => {
            format!("Failed to save file: {} | Error: {}", outcome.url, message)
        }
    }
}

fn phase_line(phase: &Phase) -> String {
    match phase {
        Phase::EnumerationStarted { ids } => {
            format!("Starting ID enumeration and link extraction over {} ID(s)...", ids)
        }
        Phase::NoLinksFound => "No links found.".to_string(),
        Phase::DownloadsStarted { links } => format!(
            "Links successfully extracted ({} distinct). Starting downloads...",
            links
        ),
        Phase::Completed { download_dir } => format!(
            "Process completed. Downloaded files are in '{}/'.",
            download_dir
        ),
    }
}

fn json_line(record: &Record<'_>) -> String {
    // Every field is a string, integer, path or list of strings, none of
    // which can fail to serialize
    serde_json::to_string(record).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to serialize status record");
        String::from("{}")
    })
}
