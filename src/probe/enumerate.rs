// src/probe/enumerate.rs
// =============================================================================
// Runs one probe per identifier, all at once.
//
// Lifecycle:
//   Enumerator (idle)  --run()-->  every probe task spawned (running)
//                      --join-->   Enumeration (drained)
//
// No concurrency cap in this phase: every ID in the range gets its own tokio
// task immediately. `join_all` is the barrier; the collector is read only
// after the last task has been joined.
// =============================================================================

use super::collector::LinkCollector;
use super::worker::{run_probe, ProbeResult};
use crate::config::ScanConfig;
use crate::report::Reporter;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;

/// The drained state: every probe has finished
#[derive(Debug)]
pub struct Enumeration {
    /// One result per probe task that ran to completion, in ID order
    pub results: Vec<ProbeResult>,
    /// Distinct links across all probes, in no particular order
    pub links: Vec<String>,
}

/// Idle enumerator, ready to fan out over the configured ID range
pub struct Enumerator {
    client: Client,
    config: Arc<ScanConfig>,
    reporter: Arc<Reporter>,
    collector: Arc<LinkCollector>,
}

impl Enumerator {
    pub fn new(client: Client, config: Arc<ScanConfig>, reporter: Arc<Reporter>) -> Self {
        Self {
            client,
            config,
            reporter,
            collector: Arc::new(LinkCollector::new()),
        }
    }

    /// Probes every ID in the range and returns once all of them are done.
    ///
    /// Consumes the enumerator, so a range can only be enumerated once.
    pub async fn run(self) -> Enumeration {
        let range = self.config.id_range;
        tracing::debug!(start = range.start, end = range.end, "enumeration running");

        let handles: Vec<_> = range
            .ids()
            .map(|id| {
                let client = self.client.clone();
                let config = Arc::clone(&self.config);
                let collector = Arc::clone(&self.collector);
                let reporter = Arc::clone(&self.reporter);
                tokio::spawn(async move {
                    run_probe(&client, &config, id, &collector, &reporter).await
                })
            })
            .collect();

        // join_all keeps the order of `handles`, so zipping with the range
        // pairs every join result with its ID
        let mut results = Vec::with_capacity(handles.len());
        for (id, joined) in range.ids().zip(join_all(handles).await) {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!(id, error = %e, "probe task failed"),
            }
        }

        tracing::debug!(
            probes = results.len(),
            links = self.collector.len(),
            "enumeration drained"
        );

        Enumeration {
            results,
            links: self.collector.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdRange;
    use crate::http::build_client;
    use crate::probe::ProbeStatus;
    use crate::report::{capture, ReportFormat};
    use std::collections::HashSet;
    use std::path::Path;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn enumerator(config: ScanConfig) -> (Enumerator, capture::Captured) {
        let client = build_client(&config).unwrap();
        let (reporter, captured) = capture::reporter(ReportFormat::Text);
        (
            Enumerator::new(client, Arc::new(config), Arc::new(reporter)),
            captured,
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_one_request_per_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/doc.php"))
            .respond_with(ResponseTemplate::new(404))
            .expect(15)
            .mount(&server)
            .await;

        let mut config = ScanConfig::for_tests(&server.uri(), Path::new("unused"));
        config.id_range = IdRange { start: 6, end: 20 };
        let (enumerator, captured) = enumerator(config);

        let enumeration = enumerator.run().await;
        assert_eq!(enumeration.results.len(), 15);
        assert!(enumeration.links.is_empty());
        assert_eq!(captured.lines().len(), 15);

        let requests = server.received_requests().await.unwrap();
        let uids: Vec<String> = requests
            .iter()
            .map(|r| r.url.query().unwrap_or_default().to_string())
            .collect();
        let distinct: HashSet<_> = uids.iter().collect();
        assert_eq!(distinct.len(), 15, "an ID was probed twice: {uids:?}");
        for id in 6..=20 {
            assert!(uids.contains(&format!("uid={id}")), "uid={id} never probed");
        }
        for request in &requests {
            let body = String::from_utf8_lossy(&request.body);
            assert_eq!(Some(&*body), request.url.query());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_links_are_deduplicated() {
        let server = MockServer::start().await;
        // Every ID sees the same two links plus one of its own
        for id in 1..=30u64 {
            Mock::given(method("POST"))
                .and(query_param("uid", id.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    "/files/1.pdf /files/2.pdf /files/{}.pdf",
                    100 + id
                )))
                .mount(&server)
                .await;
        }

        let mut config = ScanConfig::for_tests(&server.uri(), Path::new("unused"));
        config.id_range = IdRange { start: 1, end: 30 };
        let (enumerator, _captured) = enumerator(config);

        let enumeration = enumerator.run().await;
        assert_eq!(enumeration.links.len(), 32);
        let distinct: HashSet<_> = enumeration.links.iter().collect();
        assert_eq!(distinct.len(), 32);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("uid", "1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("/files/9.pdf"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("uid", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("/files/5.pdf"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("uid", "3"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let config = ScanConfig::for_tests(&server.uri(), Path::new("unused"));
        let (enumerator, _captured) = enumerator(config);
        let enumeration = enumerator.run().await;

        assert_eq!(enumeration.links, vec!["/files/5.pdf"]);
        let statuses: Vec<_> = enumeration.results.iter().map(|r| &r.status).collect();
        assert_eq!(
            statuses,
            vec![
                &ProbeStatus::HttpError { code: 500 },
                &ProbeStatus::Success {
                    links: vec!["/files/5.pdf".to_string()]
                },
                &ProbeStatus::HttpError { code: 403 },
            ]
        );
    }
}
