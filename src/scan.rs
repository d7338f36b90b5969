// src/scan.rs
// =============================================================================
// Sequences the two phases of a scan.
//
//   enumerate all IDs  ->  snapshot distinct links  ->  download them
//
// The download phase cannot start before enumeration has fully drained:
// Enumerator::run only returns after joining every probe task, and the link
// list it returns is the single snapshot of the collector.
// =============================================================================

use crate::config::ScanConfig;
use crate::download::{DownloadSummary, Downloader};
use crate::probe::{Enumerator, ProbeResult};
use crate::report::{Phase, Reporter};
use reqwest::Client;
use std::sync::Arc;

/// Everything a finished run produced
#[derive(Debug)]
pub struct ScanSummary {
    pub probes: Vec<ProbeResult>,
    pub links: Vec<String>,
    /// `None` when enumeration found no links and downloads were skipped
    pub downloads: Option<DownloadSummary>,
}

/// Runs a whole scan. Per-unit failures are reported, never returned.
pub async fn run_scan(
    config: Arc<ScanConfig>,
    client: Client,
    reporter: Arc<Reporter>,
) -> ScanSummary {
    reporter.phase(&Phase::EnumerationStarted {
        ids: config.id_range.count(),
    });

    let enumeration = Enumerator::new(client.clone(), Arc::clone(&config), Arc::clone(&reporter))
        .run()
        .await;

    if enumeration.links.is_empty() {
        reporter.phase(&Phase::NoLinksFound);
        return ScanSummary {
            probes: enumeration.results,
            links: Vec::new(),
            downloads: None,
        };
    }

    reporter.phase(&Phase::DownloadsStarted {
        links: enumeration.links.len(),
    });

    let downloads = Downloader::new(client, Arc::clone(&config), Arc::clone(&reporter))
        .run(enumeration.links.clone())
        .await;

    reporter.phase(&Phase::Completed {
        download_dir: config.download_dir.display().to_string(),
    });

    ScanSummary {
        probes: enumeration.results,
        links: enumeration.links,
        downloads: Some(downloads),
    }
}
