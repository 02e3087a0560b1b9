// src/browser/chrome.rs
// =============================================================================
// Headless Chromium, driven over the Chrome DevTools Protocol.
//
// chromiumoxide launches the browser process and hands back two things:
// - a `Browser` handle we send commands through
// - a `Handler` stream that must be polled continuously for those commands
//   to make progress
// The handler is pumped on its own tokio task for the life of the session.
//
// Single-page-app sites render their navigation client side, so this is the
// driver to use whenever anchors only exist after JavaScript runs.
// =============================================================================

use super::{Browser, BrowserError, LaunchOptions};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// Collects every anchor's resolved href, as strings.
//
// HTML anchors expose the absolute URL on the `href` property. SVG anchors
// expose an SVGAnimatedString there instead, so those fall back to the raw
// attribute resolved against the document base.
const ANCHOR_HREFS_JS: &str = r#"
Array.from(document.getElementsByTagName('a')).map(a => {
    if (typeof a.href === 'string') return a.href;
    const raw = a.getAttribute('href') || (a.href && a.href.baseVal) || '';
    if (!raw) return '';
    try { return new URL(raw, document.baseURI).href; } catch (e) { return raw; }
})
"#;

pub struct ChromeBrowser {
    browser: CdpBrowser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeBrowser {
    pub async fn launch(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder();
        if options.headful {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Keep the event loop running until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        debug!("chromium session started");

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn find(&self, id: &str) -> Result<chromiumoxide::element::Element, BrowserError> {
        self.page
            .find_element(id_selector(id))
            .await
            .map_err(|_| BrowserError::not_found(id))
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;
        Ok(())
    }

    async fn fill(&mut self, id: &str, text: &str) -> Result<(), BrowserError> {
        let element = self.find(id).await?;
        // Focus first so the keystrokes land in the right control
        element
            .click()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(())
    }

    async fn click(&mut self, id: &str) -> Result<(), BrowserError> {
        let element = self.find(id).await?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        // Submit controls navigate; let that finish before anyone reads the DOM
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(())
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, BrowserError> {
        let result = self
            .page
            .evaluate(ANCHOR_HREFS_JS)
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        result
            .into_value::<Vec<String>>()
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn quit(self: Box<Self>) -> Result<(), BrowserError> {
        let ChromeBrowser {
            mut browser,
            handler,
            ..
        } = *self;

        let closed = browser
            .close()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()));
        if let Err(e) = browser.wait().await {
            warn!("chromium did not exit cleanly: {}", e);
        }
        handler.abort();
        closed.map(|_| ())
    }
}

// CSS selector matching an element by id.
//
// `#id` breaks on ids that start with a digit or contain punctuation, so use
// the attribute form and escape what a quoted CSS string cannot hold.
fn id_selector(id: &str) -> String {
    let escaped = id.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[id=\"{}\"]", escaped)
}
