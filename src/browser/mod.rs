// src/browser/mod.rs
// =============================================================================
// This module is the browser-automation capability the crawler drives.
//
// Everything the rest of the program needs from a browser fits in a handful
// of operations: load a URL, type into a control, click a control, list the
// anchors on the page, and shut down. Those operations live on the `Browser`
// trait so the crawler and the login step never care which engine is behind
// them.
//
// Implementations:
// - chrome: a real headless Chromium driven over the DevTools protocol
// - http:   plain HTTP fetches + HTML parsing (no JavaScript, no Chromium)
// - mock:   scripted in-memory site graph, tests only
//
// Rust concepts:
// - Traits: Shared behaviour across different types
// - Trait objects (Box<dyn Browser>): Pick the implementation at runtime
// - async-trait: Async methods on a trait that can still be boxed
// =============================================================================

mod chrome;
mod http;
#[cfg(test)]
pub mod mock;

pub use chrome::ChromeBrowser;
pub use http::HttpBrowser;

use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by any browser implementation.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No element with this id exists on the current page
    #[error("control not found: no element with id '{id}'")]
    ElementNotFound { id: String },

    /// Loading a page failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The browser could not be started
    #[error("could not launch browser: {0}")]
    Launch(String),

    /// Anything else the driver reported
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl BrowserError {
    pub fn not_found(id: &str) -> Self {
        BrowserError::ElementNotFound { id: id.to_string() }
    }

    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        BrowserError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

// The operations the crawler consumes from a browser session.
//
// A session is exclusively owned by one caller at a time, so every method
// takes &mut self. `quit` consumes the boxed session: nothing can touch it
// after it has been released.
#[async_trait]
pub trait Browser: Send {
    /// Load `url` and block until the page reports it has loaded.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Find the element with this id and type `text` into it.
    async fn fill(&mut self, id: &str, text: &str) -> Result<(), BrowserError>;

    /// Find the element with this id and click it.
    async fn click(&mut self, id: &str) -> Result<(), BrowserError>;

    /// The `href` of every `<a>` on the page, in document order, resolved
    /// against the page URL. Duplicates and empty values are passed through.
    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, BrowserError>;

    /// URL of the page currently loaded.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Release the session.
    async fn quit(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Which engine to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Driver {
    /// Headless Chromium over the DevTools protocol
    Chrome,
    /// Static HTML over plain HTTP
    Http,
}

/// Options that only matter when launching.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Show the Chromium window instead of running headless
    pub headful: bool,
}

// Starts a new session with the chosen engine
pub async fn launch(driver: Driver, options: &LaunchOptions) -> Result<Box<dyn Browser>, BrowserError> {
    match driver {
        Driver::Chrome => Ok(Box::new(ChromeBrowser::launch(options).await?)),
        Driver::Http => Ok(Box::new(HttpBrowser::new()?)),
    }
}
