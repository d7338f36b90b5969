// src/http.rs
// =============================================================================
// Shared HTTP plumbing: building the single reqwest Client used by both
// phases, and turning reqwest errors into short readable messages.
// =============================================================================

use crate::config::ScanConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use std::error::Error as _;

/// Builds the client every probe and download goes through.
///
/// Client is an Arc internally, so workers clone it instead of building
/// their own (one connection pool for the whole run).
pub fn build_client(config: &ScanConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("idor-enum/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10));

    // Connection setup only; downloads have no total deadline. Probes add
    // their own per-request deadline in probe/worker.rs.
    if let Some(timeout) = config.request_timeout {
        builder = builder.connect_timeout(timeout);
    }

    builder.build().context("failed to create HTTP client")
}

/// Describes a transport-level failure
///
/// reqwest's own Display only says "error sending request for url (...)";
/// the useful part (connection refused, dns error, ...) is in the source
/// chain, so we walk it.
pub fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        return "request timed out".to_string();
    }

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
