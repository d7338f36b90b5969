// src/probe/mod.rs
// =============================================================================
// This module is the enumeration phase of a scan.
//
// Submodules:
// - extract: Pulls pattern matches out of a response body
// - worker: Probes one identifier and records what it found
// - collector: The shared, deduplicating set of links
// - enumerate: Fans out one worker per identifier and waits for all of them
//
// Only the items the rest of the program needs are re-exported here; the
// collector and extractor are internal to this phase.
// =============================================================================

mod collector;
mod enumerate;
mod extract;
mod worker;

pub use enumerate::Enumerator;
pub use worker::{ProbeResult, ProbeStatus};
