// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Validate them into a ScanConfig
// 3. Prepare the output directory and the HTTP client
// 4. Run the scan (enumerate IDs, then download what they link to)
// 5. Exit with proper code (0 = run completed, 2 = bad input or setup error)
//
// A run that completes is a success even if every single probe or download
// failed; those failures are reported line by line as they happen.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - validated scan configuration
mod download; // src/download/ - bounded concurrent downloads
mod http; // src/http.rs - shared HTTP client
mod logging; // src/logging.rs - tracing setup
mod probe; // src/probe/ - ID enumeration and link collection
mod report; // src/report.rs - serialized status output
mod scan; // src/scan.rs - runs the two phases in order

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::ScanConfig;
use report::{ReportFormat, Reporter};
use std::sync::Arc;

const BANNER: &str = concat!(
    "\n  idor-enum ",
    env!("CARGO_PKG_VERSION"),
    "\n  POST every ID, scrape every link, download every file\n"
);

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Run with --help for usage.");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    logging::init(cli.verbose)?;

    if !cli.no_banner {
        eprintln!("{}", BANNER);
    }

    let format = if cli.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    };

    let config = ScanConfig::try_from(cli)?;
    tracing::debug!(?config, "configuration validated");

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create download directory '{}'",
                config.download_dir.display()
            )
        })?;

    let client = http::build_client(&config)?;
    let reporter = Arc::new(Reporter::stdout(format));

    let summary = scan::run_scan(Arc::new(config), client, reporter).await;

    let (saved, failed) = summary
        .downloads
        .as_ref()
        .map(|d| (d.saved(), d.failed()))
        .unwrap_or((0, 0));
    tracing::info!(
        probes = summary.probes.len(),
        links = summary.links.len(),
        saved,
        failed,
        "scan finished"
    );

    Ok(0)
}
