// src/report/mod.rs
// =============================================================================
// This module hands the crawl result to the audit tool.
//
// Submodules:
// - patch: atomically rewrites one line of the tool's config file
// - audit: runs the tool as a blocking subprocess
//
// This file also owns the one formatting rule that joins the two: how a URL
// set is written into that config line.
// =============================================================================

mod audit;
mod patch;

pub use audit::run_audit;
pub use patch::replace_line;

// Turns a set of URLs into the body of a quoted list literal.
//
// Example: ["https://a/y", "https://a/x"] -> "https://a/x", "https://a/y"
// (each URL double-quoted, sorted, joined with ", ")
pub fn format_url_line<S: AsRef<str>>(links: &[S]) -> String {
    let mut sorted: Vec<&str> = links.iter().map(|s| s.as_ref()).collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|url| format!("\"{}\"", url.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ")
}
