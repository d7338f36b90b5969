// src/download/orchestrator.rs
// =============================================================================
// Runs one download task per link with at most `download_concurrency` of them
// in flight.
//
// Lifecycle:
//   Downloader (idle) --run(links)--> tasks spawned (running)
//                     --join-->       DownloadSummary (completed)
//
// The bound is a tokio Semaphore. A permit is acquired *before* a task is
// spawned and moved into it; the permit is an RAII guard, so it is released
// when the task ends, whichever way it ends.
// =============================================================================

use super::worker::{download, DownloadOutcome};
use crate::config::ScanConfig;
use crate::report::Reporter;
use futures::future::join_all;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// The completed state: every download task has been joined
#[derive(Debug)]
pub struct DownloadSummary {
    pub outcomes: Vec<DownloadOutcome>,
    /// Highest number of downloads that were running at the same time
    pub peak_in_flight: usize,
}

impl DownloadSummary {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

// Counts running downloads and remembers the highest count seen
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Idle downloader for one run
pub struct Downloader {
    client: Client,
    config: Arc<ScanConfig>,
    reporter: Arc<Reporter>,
}

impl Downloader {
    pub fn new(client: Client, config: Arc<ScanConfig>, reporter: Arc<Reporter>) -> Self {
        Self {
            client,
            config,
            reporter,
        }
    }

    /// Downloads every link once and returns when all of them are done.
    pub async fn run(self, links: Vec<String>) -> DownloadSummary {
        let semaphore = Arc::new(Semaphore::new(self.config.download_concurrency));
        let in_flight = Arc::new(InFlight::default());
        let mut handles = Vec::with_capacity(links.len());

        tracing::debug!(
            links = links.len(),
            concurrency = self.config.download_concurrency,
            "downloads running"
        );

        for link in links {
            // Only fails if the semaphore is closed, which nothing here does
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(error = %e, "download semaphore closed");
                    break;
                }
            };

            let client = self.client.clone();
            let config = Arc::clone(&self.config);
            let reporter = Arc::clone(&self.reporter);
            let in_flight = Arc::clone(&in_flight);

            handles.push(tokio::spawn(async move {
                // Locals drop in reverse order: the in-flight slot is given
                // back before the permit, so the counter never exceeds the
                // number of permits
                let _permit = permit;
                let _slot = in_flight.enter();

                let outcome = download(&client, &config, &link).await;
                reporter.download(&outcome);
                outcome
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(error = %e, "download task failed"),
            }
        }

        let summary = DownloadSummary {
            outcomes,
            peak_in_flight: in_flight.peak(),
        };
        tracing::debug!(
            saved = summary.saved(),
            failed = summary.failed(),
            peak_in_flight = summary.peak_in_flight,
            "downloads completed"
        );
        summary
    }
}
