// src/probe/collector.rs
// =============================================================================
// The set of distinct links found across every probe.
//
// Every probe worker inserts into the same collector at the same time, so the
// HashSet lives behind a Mutex. The lock is only ever held for a few inserts
// and is never held across an .await, which is why a plain std Mutex is
// enough here (no need for tokio's async Mutex).
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Concurrency-safe, deduplicating link set
#[derive(Debug, Default)]
pub struct LinkCollector {
    links: Mutex<HashSet<String>>,
}

impl LinkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `link` unless it is already present. Returns true if it was new.
    pub fn insert(&self, link: String) -> bool {
        self.lock().insert(link)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Copy of every distinct link, in no particular order.
    ///
    /// Only meaningful once every worker has finished inserting.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    // A panic in another worker while it held the lock cannot leave a HashSet
    // half-inserted in a way that matters to us, so poisoning is ignored.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does insert take &self and not &mut self?
//    - Many tasks share one collector through an Arc
//    - An Arc only hands out shared references (&LinkCollector)
//    - The Mutex gives us "interior mutability": mutation through &self,
//      made safe because only one thread can hold the lock at a time
//
// 2. What is PoisonError::into_inner?
//    - If a thread panics while holding a std Mutex, the mutex is "poisoned"
//    - lock() then returns Err, but the data is still there
//    - into_inner() takes the guard out of the error so we carry on
// -----------------------------------------------------------------------------
