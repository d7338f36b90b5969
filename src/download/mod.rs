// src/download/mod.rs
// =============================================================================
// This module is the download phase of a scan.
//
// - worker: Fetches one link and streams it to a file
// - orchestrator: Runs the workers, never more than N at a time
// =============================================================================

mod orchestrator;
mod worker;

pub use orchestrator::{DownloadSummary, Downloader};
pub use worker::{DownloadOutcome, DownloadStatus};
