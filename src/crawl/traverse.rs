// src/crawl/traverse.rs
// =============================================================================
// Depth-first crawl of every in-scope page reachable from a seed URL.
//
// How it works:
// 1. "Enter" the seed: navigate, record it as both reported and visited,
//    wait for the page to settle, read every anchor's href
// 2. Walk that page's hrefs in order. For each one:
//      a. recording policy:  should it be reported?
//      b. visitation policy: should it be entered next?
//    An entered page pushes its own hrefs on top of the stack, so its
//    subtree is finished before the parent's next href is looked at
// 3. Pop a page when its hrefs run out; stop when the stack is empty
//
// This is the recursive crawl written with an explicit stack: same order of
// navigations, same set updates, but the depth of the site can't overflow
// the call stack.
//
// Dedup: URLs that differ only in their query string share a "base path".
// Only the first query variant seen for a base path is reported, and only
// the first one scheduled is visited. A query-less URL is handled by its own
// branch, so it is never suppressed by an earlier query variant.
//
// Rust concepts:
// - HashSet: O(1) membership checks for the four bookkeeping sets
// - Vec as a stack: push/pop/last_mut
// - vec::IntoIter: a page's remaining hrefs, consumed one by one
// =============================================================================

use super::scope::{base_path, has_query, Scope};
use crate::browser::{Browser, BrowserError};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

// All the state one crawl accumulates, owned by the top-level call
#[derive(Debug, Default)]
pub struct CrawlContext {
    /// URLs accepted for the report
    pub links: HashSet<String>,
    /// URLs whose page has been loaded and scanned
    pub traversed: HashSet<String>,
    /// Base paths that already have a query variant in `links`
    pub link_exclude: HashSet<String>,
    /// Base paths that already had a query variant scheduled for a visit
    pub traverse_exclude: HashSet<String>,
}

impl CrawlContext {
    // Recording policy. Returns true if `url` was added to `links`.
    pub fn record(&mut self, scope: &Scope, url: &str) -> bool {
        if !scope.accepts(url) || self.links.contains(url) {
            return false;
        }

        if !has_query(url) {
            self.links.insert(url.to_string());
            return true;
        }

        let base = base_path(url);
        if self.link_exclude.contains(base) {
            return false;
        }
        self.link_exclude.insert(base.to_string());
        self.links.insert(url.to_string());
        true
    }

    // Visitation policy. Returns true if `url` should be entered now.
    //
    // Scheduling a query URL claims its base path, so this is not a pure check.
    pub fn should_visit(&mut self, scope: &Scope, url: &str) -> bool {
        if !scope.accepts(url) || self.traversed.contains(url) {
            return false;
        }

        if !has_query(url) {
            return true;
        }

        self.traverse_exclude.insert(base_path(url).to_string())
    }

    // The seed is entered without going through either policy, so a seed
    // with a query string claims its base path here. Otherwise a later
    // variant of the same page would be reported and visited as well.
    fn claim_seed(&mut self, seed: &str) {
        if has_query(seed) {
            let base = base_path(seed).to_string();
            self.link_exclude.insert(base.clone());
            self.traverse_exclude.insert(base);
        }
    }
}

/// What a finished crawl hands back.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Every URL accepted for the audit, sorted
    pub links: Vec<String>,
    /// Number of distinct pages loaded
    pub pages_visited: usize,
    /// Each navigation, in the order it happened
    pub navigation_order: Vec<String>,
}

// One page whose hrefs are still being walked
struct Frame {
    hrefs: std::vec::IntoIter<String>,
}

pub struct Crawler {
    scope: Scope,
    settle: Duration,
}

impl Crawler {
    pub fn new(scope: Scope, settle: Duration) -> Self {
        Self { scope, settle }
    }

    /// Crawls everything reachable from `seed`.
    ///
    /// A browser error aborts the whole crawl; nothing gathered so far is
    /// returned.
    pub async fn crawl(&self, browser: &mut dyn Browser, seed: &str) -> Result<CrawlReport, BrowserError> {
        info!(seed, host = self.scope.host(), "starting crawl");

        let mut ctx = CrawlContext::default();
        ctx.claim_seed(seed);
        let mut order = Vec::new();
        let mut stack = vec![self.enter(browser, &mut ctx, &mut order, seed).await?];

        while let Some(frame) = stack.last_mut() {
            let Some(href) = frame.hrefs.next() else {
                stack.pop();
                continue;
            };

            if ctx.record(&self.scope, &href) {
                debug!(url = %href, "recorded");
            }

            if ctx.should_visit(&self.scope, &href) {
                let frame = self.enter(browser, &mut ctx, &mut order, &href).await?;
                stack.push(frame);
            }
        }

        let mut links: Vec<String> = ctx.links.into_iter().collect();
        links.sort();

        info!(
            links = links.len(),
            pages = ctx.traversed.len(),
            "crawl finished"
        );

        Ok(CrawlReport {
            links,
            pages_visited: ctx.traversed.len(),
            navigation_order: order,
        })
    }

    // Loads a page, marks it seen and reads its hrefs
    async fn enter(
        &self,
        browser: &mut dyn Browser,
        ctx: &mut CrawlContext,
        order: &mut Vec<String>,
        page: &str,
    ) -> Result<Frame, BrowserError> {
        browser.navigate(page).await?;
        order.push(page.to_string());

        // Unconditional, even if the URL was filtered out on the way here
        ctx.links.insert(page.to_string());
        ctx.traversed.insert(page.to_string());

        // Client-rendered pages keep adding anchors after load fires
        tokio::time::sleep(self.settle).await;

        let hrefs = browser.anchor_hrefs().await?;
        debug!(page, anchors = hrefs.len(), loaded = order.len(), "scanned");

        Ok(Frame {
            hrefs: hrefs.into_iter(),
        })
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just call enter() recursively?
//    - Every recursive async call boxes a new future and grows the stack
//    - A site with a long "next page" chain would go thousands of levels deep
//    - A Vec of frames lives on the heap and can grow as far as memory allows
//
// 2. Why does should_visit take &mut self?
//    - For a URL with a query string, saying "yes" also claims its base path
//    - HashSet::insert returns false when the value was already there, so the
//      check and the claim are one call
//
// 3. What is `let ... else`?
//    - Pattern match that must succeed, or the else block runs (and must
//      leave the scope with continue/return/break)
//    - Here: take the next href, or pop the exhausted frame
// -----------------------------------------------------------------------------
