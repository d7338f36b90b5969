// src/probe/worker.rs
// =============================================================================
// Probes a single identifier.
//
// For one ID this:
// 1. Builds the target URL (placeholder replaced by the ID)
// 2. POSTs `uid=<ID>` as a urlencoded form
// 3. On HTTP 200, scrapes the body for links and adds them to the collector
// 4. Reports one status record, whatever happened
//
// Nothing here returns an error. Every failure becomes a ProbeStatus so that
// one bad ID never affects the others.
// =============================================================================

use super::collector::LinkCollector;
use super::extract::extract_links;
use crate::config::ScanConfig;
use crate::http::describe_error;
use crate::report::Reporter;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What happened when one identifier was probed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeStatus {
    /// HTTP 200; `links` may be empty and may contain duplicates
    Success { links: Vec<String> },
    /// Any status other than exactly 200
    HttpError { code: u16 },
    /// DNS, connect, timeout or body read failure
    TransportError { message: String },
}

/// Outcome of probing one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub id: u64,
    #[serde(flatten)]
    pub status: ProbeStatus,
}

impl ProbeResult {
    pub fn links(&self) -> &[String] {
        match &self.status {
            ProbeStatus::Success { links } => links.as_slice(),
            _ => &[],
        }
    }
}

/// Form body sent with every probe
fn form_body(id: u64) -> String {
    format!("uid={}", id)
}

/// Sends the probe for `id` and classifies the response. No side effects.
pub async fn probe(client: &Client, config: &ScanConfig, id: u64) -> ProbeResult {
    let url = config.probe_url(id);
    tracing::debug!(id, %url, "probing");

    let mut request = client
        .post(&url)
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .body(form_body(id));
    // Deadline for the whole exchange, body included
    if let Some(timeout) = config.request_timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await;

    let status = match response {
        Ok(response) => analyze_response(config, response).await,
        Err(e) => ProbeStatus::TransportError {
            message: describe_error(&e),
        },
    };

    ProbeResult { id, status }
}

// Only an exact 200 counts; 204 or a final 3xx are reported as HTTP errors
async fn analyze_response(config: &ScanConfig, response: reqwest::Response) -> ProbeStatus {
    let status_code = response.status();
    if status_code != StatusCode::OK {
        return ProbeStatus::HttpError {
            code: status_code.as_u16(),
        };
    }

    match response.bytes().await {
        Ok(body) => ProbeStatus::Success {
            links: extract_links(&body, &config.link_pattern),
        },
        Err(e) => ProbeStatus::TransportError {
            message: format!("error reading response: {}", describe_error(&e)),
        },
    }
}

/// Probes `id`, feeds any links into the collector, and reports the outcome.
pub async fn run_probe(
    client: &Client,
    config: &ScanConfig,
    id: u64,
    collector: &LinkCollector,
    reporter: &Reporter,
) -> ProbeResult {
    let result = probe(client, config, id).await;

    let new_links = result
        .links()
        .iter()
        .filter(|link| collector.insert(link.to_string()))
        .count();
    if new_links > 0 {
        tracing::debug!(id, new_links, "links collected");
    }

    reporter.probe(&result);
    result
}
