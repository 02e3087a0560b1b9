// src/crawl/scope.rs
// =============================================================================
// Decides which discovered URLs belong to the crawl.
//
// A URL is in scope when all three hold:
// 1. it contains the target host (plain substring match)
// 2. it has no fragment marker '#': in-page anchors are not separate pages
// 3. it contains none of the skip markers (e.g. "logout", which would end
//    the session in the middle of the crawl)
//
// Also home to the two query-string helpers the dedup policy is built on.
// =============================================================================

use anyhow::{anyhow, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Scope {
    host: String,
    skip_markers: Vec<String>,
}

impl Scope {
    pub fn new(host: impl Into<String>, skip_markers: Vec<String>) -> Self {
        // An empty marker is a substring of every URL and would reject everything
        let skip_markers = skip_markers.into_iter().filter(|m| !m.is_empty()).collect();
        Self {
            host: host.into(),
            skip_markers,
        }
    }

    /// Builds a scope around `start_url`'s host unless one is given.
    pub fn for_start_url(start_url: &str, host: Option<&str>, skip_markers: Vec<String>) -> Result<Self> {
        let host = match host {
            Some(host) => host.to_string(),
            None => host_of(start_url)?,
        };
        Ok(Self::new(host, skip_markers))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    // The in-scope filter
    pub fn accepts(&self, url: &str) -> bool {
        url.contains(&self.host)
            && !url.contains('#')
            && !self.skip_markers.iter().any(|marker| url.contains(marker.as_str()))
    }
}

/// Everything before the first '?'.
pub fn base_path(url: &str) -> &str {
    match url.split_once('?') {
        Some((base, _)) => base,
        None => url,
    }
}

pub fn has_query(url: &str) -> bool {
    url.contains('?')
}

fn host_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| anyhow!("Invalid URL '{}': {}", url, e))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("URL has no host: {}", url))
}
