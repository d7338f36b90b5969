// src/probe/extract.rs
// =============================================================================
// Finds file links inside a response body.
//
// The response is not parsed as HTML or even decoded: the user's regular
// expression runs over the raw body bytes, and every non-overlapping match is
// a link, exactly as it appears on the wire.
// =============================================================================

use regex::bytes::Regex;

/// Returns every non-overlapping match of `pattern` in `body`, in the order
/// they appear. Duplicates are kept; the collector deduplicates later.
///
/// Example:
///   body = "see /documents/a.pdf and /documents/b.txt"
///   pattern = /documents/.*?\.[a-zA-Z0-9]+
///   result = ["/documents/a.pdf", "/documents/b.txt"]
pub fn extract_links(body: &[u8], pattern: &Regex) -> Vec<String> {
    pattern
        .find_iter(body)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect()
}
