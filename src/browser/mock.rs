// src/browser/mock.rs
// A scripted site graph for tests: each URL maps to the hrefs found on it.

use super::{Browser, BrowserError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct MockLog {
    pub navigations: Vec<String>,
    pub filled: Vec<(String, String)>,
    pub clicked: Vec<String>,
    /// Every call above, in order, as "navigate:<url>", "fill:<id>", "click:<id>"
    pub events: Vec<String>,
    pub quit: bool,
}

pub struct MockBrowser {
    pages: HashMap<String, Vec<String>>,
    controls: HashSet<String>,
    current: Option<String>,
    log: Arc<Mutex<MockLog>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            controls: HashSet::new(),
            current: None,
            log: Arc::new(Mutex::new(MockLog::default())),
        }
    }

    /// Adds a page and the hrefs on it.
    pub fn page(mut self, url: &str, hrefs: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), hrefs.iter().map(|h| h.to_string()).collect());
        self
    }

    /// Adds a control id that fill/click can find.
    pub fn control(mut self, id: &str) -> Self {
        self.controls.insert(id.to_string());
        self
    }

    /// Shared handle to the call log, still readable after the browser moves.
    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        {
            let mut log = self.log.lock().unwrap();
            log.navigations.push(url.to_string());
            log.events.push(format!("navigate:{}", url));
        }
        if !self.pages.contains_key(url) {
            return Err(BrowserError::navigation(url, "HTTP 404"));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn fill(&mut self, id: &str, text: &str) -> Result<(), BrowserError> {
        if !self.controls.contains(id) {
            return Err(BrowserError::not_found(id));
        }
        let mut log = self.log.lock().unwrap();
        log.filled.push((id.to_string(), text.to_string()));
        log.events.push(format!("fill:{}", id));
        Ok(())
    }

    async fn click(&mut self, id: &str) -> Result<(), BrowserError> {
        if !self.controls.contains(id) {
            return Err(BrowserError::not_found(id));
        }
        let mut log = self.log.lock().unwrap();
        log.clicked.push(id.to_string());
        log.events.push(format!("click:{}", id));
        Ok(())
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, BrowserError> {
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| BrowserError::Protocol("no page loaded".to_string()))?;
        Ok(self.pages.get(current).cloned().unwrap_or_default())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone().unwrap_or_default())
    }

    async fn quit(self: Box<Self>) -> Result<(), BrowserError> {
        self.log.lock().unwrap().quit = true;
        Ok(())
    }
}
