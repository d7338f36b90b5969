// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags here are raw user input. Nothing in this file validates them
// beyond what clap does for us (required flags, integer parsing). Turning them
// into a trusted ScanConfig is the job of src/config.rs.
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Derive macros: Automatically generate code for our types
// - ArgAction::Count: a flag that can be repeated (-v, -vv)
// =============================================================================

use clap::{ArgAction, Parser};

/// Default pattern used to capture file links from each response.
pub const DEFAULT_PATTERN: &str = r"/documents/.*?\.[a-zA-Z0-9]+";

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug, Clone)]
#[command(
    name = "idor-enum",
    version = "0.1.0",
    about = "Enumerates IDOR (Insecure Direct Object References) on a web server for mass data gathering",
    long_about = "idor-enum POSTs every ID in a range to an endpoint, scrapes the responses for file links \
                  matching a regular expression, and downloads every distinct link it found.\n\n\
                  Example:\n  idor-enum -u http://10.10.10.10:8080 -r 1-20 -e \"/documents.php?uid=UID\" \
                  -p \"/documents/.*?\\.(txt|pdf)\" -c 5"
)]
pub struct Cli {
    /// Base URL of the target server (e.g., http://SERVER_IP:PORT)
    #[arg(short = 'u', long = "url")]
    pub url: String,

    /// Range of IDs in the format START-END (e.g., 1-100)
    #[arg(short = 'r', long = "range")]
    pub range: String,

    /// Endpoint with the placeholder where the ID goes (e.g., /documents.php?uid=UID)
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: String,

    /// Regular expression to capture file links
    #[arg(short = 'p', long = "pattern", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Number of simultaneous downloads
    ///
    /// Signed on purpose: a negative value should reach our own validation
    /// and produce our own error message
    #[arg(short = 'c', long = "concurrency", default_value_t = 5, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Directory the downloaded files are written to
    #[arg(short = 'o', long = "output-dir", default_value = "downloads")]
    pub output_dir: String,

    /// Token in the endpoint that gets replaced by each ID
    #[arg(long, default_value = "UID")]
    pub placeholder: String,

    /// Seconds allowed for each ID request and for connecting before a download (0 = no timeout)
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Refuse to overwrite files that already exist in the output directory
    #[arg(long)]
    pub no_clobber: bool,

    /// Print status records as JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Do not print the banner
    #[arg(long)]
    pub no_banner: bool,

    /// Increase diagnostic logging on stderr (-v = debug, -vv = trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is `range` a String and not two numbers?
//    - The user types "1-100" as a single token
//    - Splitting and checking it belongs to config validation, where we can
//      give a precise error for each way it can be wrong
//
// 2. What does `default_value = DEFAULT_PATTERN` do?
//    - clap fills the field with that string when -p is not given
//    - Keeping it in a const lets tests and docs refer to the same value
//
// 3. What is ArgAction::Count?
//    - Each -v adds one to the counter, so -vv gives 2
// -----------------------------------------------------------------------------
