// src/crawl/mod.rs
// =============================================================================
// This module finds every page of the site that should be audited.
//
// Submodules:
// - scope:    which URLs count as "this site" (host, no fragments, no logout)
// - traverse: the depth-first walk and the query-string dedup bookkeeping
// =============================================================================

mod scope;
mod traverse;

pub use scope::Scope;
pub use traverse::{CrawlReport, Crawler};
