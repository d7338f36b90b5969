// src/logging.rs
// Diagnostic logging to stderr. Status records go to stdout through the
// Reporter, so `idor-enum ... --json | jq` stays clean at any verbosity.

use anyhow::{anyhow, Result};
use tracing_subscriber::filter::LevelFilter;

/// Maps the number of `-v` flags to a maximum log level
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init(verbosity: u8) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
