// src/browser/http.rs
// =============================================================================
// A "browser" made of plain HTTP requests and an HTML parser.
//
// No JavaScript runs here. That is enough for server-rendered sites and for
// classic login pages (a <form> that POSTs credentials and sets a session
// cookie), and it needs nothing installed besides this binary.
//
// How the operations map:
// - navigate:      GET the URL, remember the final URL and the HTML body
// - fill:          check the control exists, remember the value for its id
// - click:         on a link, follow it; on anything inside a <form>, submit
//                  that form with its current inputs + the filled values
// - anchor_hrefs:  every <a> in the stored HTML, resolved against the page
//
// The cookie store on the reqwest client carries the login session from the
// form submission into every later page fetch.
//
// Rust concepts:
// - scraper::Html is not Send, so it is parsed inside plain (non-async)
//   helper functions and never held across an .await
// =============================================================================

use super::{Browser, BrowserError};
use async_trait::async_trait;
use reqwest::{Client, Method};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub struct HttpBrowser {
    client: Client,
    // Final URL of the last page load (after redirects)
    url: Option<Url>,
    html: String,
    // Values typed into controls on the current page, keyed by element id
    filled: HashMap<String, String>,
}

// What submitting a form turns into
#[derive(Debug, PartialEq)]
struct Submission {
    method: Method,
    action: Url,
    fields: Vec<(String, String)>,
}

// What clicking a control turns into
#[derive(Debug, PartialEq)]
enum ClickAction {
    Follow(Url),
    Submit(Submission),
}

impl HttpBrowser {
    pub fn new() -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .cookie_store(true)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            client,
            url: None,
            html: String::new(),
            filled: HashMap::new(),
        })
    }

    fn base(&self) -> Result<&Url, BrowserError> {
        self.url
            .as_ref()
            .ok_or_else(|| BrowserError::Protocol("no page loaded".to_string()))
    }

    // Sends a request and makes the response the current page
    async fn load(&mut self, method: Method, url: Url, fields: &[(String, String)]) -> Result<(), BrowserError> {
        let request = if method == Method::GET {
            let request = self.client.get(url.clone());
            if fields.is_empty() {
                request
            } else {
                request.query(fields)
            }
        } else {
            self.client.request(method, url.clone()).form(fields)
        };

        let response = request
            .send()
            .await
            .map_err(|e| BrowserError::navigation(url.as_str(), e))?;

        // A browser still shows an error page; only transport failures abort
        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "page answered with an error status");
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| BrowserError::navigation(url.as_str(), e))?;

        debug!(url = %final_url, bytes = html.len(), "page loaded");

        self.url = Some(final_url);
        self.html = html;
        self.filled.clear();
        Ok(())
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let parsed = Url::parse(url).map_err(|e| BrowserError::navigation(url, e))?;
        self.load(Method::GET, parsed, &[]).await
    }

    async fn fill(&mut self, id: &str, text: &str) -> Result<(), BrowserError> {
        if !has_element(&self.html, id) {
            return Err(BrowserError::not_found(id));
        }
        self.filled.insert(id.to_string(), text.to_string());
        Ok(())
    }

    async fn click(&mut self, id: &str) -> Result<(), BrowserError> {
        let action = click_action(&self.html, self.base()?, id, &self.filled)?;
        match action {
            ClickAction::Follow(url) => self.load(Method::GET, url, &[]).await,
            ClickAction::Submit(form) => {
                debug!(action = %form.action, method = %form.method, "submitting form");
                self.load(form.method, form.action, &form.fields).await
            }
        }
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>, BrowserError> {
        let base = self.base()?;
        Ok(extract_anchor_hrefs(&self.html, base))
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.base()?.to_string())
    }

    async fn quit(self: Box<Self>) -> Result<(), BrowserError> {
        // Dropping the client drops the cookie jar; nothing else to release
        Ok(())
    }
}

fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    // Constant selector, known to be valid
    let any = Selector::parse("*").unwrap();
    document.select(&any).find(|el| el.value().id() == Some(id))
}

fn has_element(html: &str, id: &str) -> bool {
    let document = Html::parse_document(html);
    find_by_id(&document, id).is_some()
}

// Every <a> on the page, in document order.
//
// An anchor without an href yields "" so callers see exactly as many values
// as there are anchors. Hrefs that cannot be resolved are passed through raw.
fn extract_anchor_hrefs(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").unwrap();

    document
        .select(&selector)
        .map(|anchor| match anchor.value().attr("href") {
            Some(href) => resolve_url(base, href).unwrap_or_else(|| href.to_string()),
            None => String::new(),
        })
        .collect()
}

// Resolves a possibly-relative href against the page URL
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.join(href).ok().map(|url| url.to_string()),
    }
}

fn click_action(
    html: &str,
    base: &Url,
    id: &str,
    filled: &HashMap<String, String>,
) -> Result<ClickAction, BrowserError> {
    let document = Html::parse_document(html);
    let control = find_by_id(&document, id).ok_or_else(|| BrowserError::not_found(id))?;

    if control.value().name() == "a" {
        let href = control.value().attr("href").unwrap_or("");
        let target = base
            .join(href)
            .map_err(|e| BrowserError::navigation(href, e))?;
        return Ok(ClickAction::Follow(target));
    }

    let form = control
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .ok_or_else(|| BrowserError::Protocol(format!("control '{}' is not inside a form", id)))?;

    Ok(ClickAction::Submit(build_submission(form, control, base, filled)?))
}

// Serializes a form the way a browser would when `submitter` is clicked.
//
// Successful controls: named inputs/textareas/selects, checkboxes and radios
// only when checked, and among the buttons only the one that was clicked.
fn build_submission(
    form: ElementRef<'_>,
    submitter: ElementRef<'_>,
    base: &Url,
    filled: &HashMap<String, String>,
) -> Result<Submission, BrowserError> {
    let controls = Selector::parse("input[name], textarea[name], select[name], button[name]").unwrap();
    let option = Selector::parse("option").unwrap();

    let mut fields = Vec::new();
    for control in form.select(&controls) {
        let el = control.value();
        let name = el.attr("name").unwrap_or_default().to_string();
        let kind = el.attr("type").unwrap_or("").to_ascii_lowercase();
        let typed = el.id().and_then(|id| filled.get(id)).cloned();

        let value = match (el.name(), kind.as_str()) {
            ("button", _) | ("input", "submit" | "image" | "button" | "reset") => {
                if control != submitter {
                    continue;
                }
                el.attr("value").unwrap_or_default().to_string()
            }
            ("input", "checkbox" | "radio") => {
                if el.attr("checked").is_none() {
                    continue;
                }
                el.attr("value").unwrap_or("on").to_string()
            }
            ("textarea", _) => typed.unwrap_or_else(|| control.text().collect()),
            ("select", _) => {
                let options: Vec<_> = control.select(&option).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.first());
                match chosen {
                    Some(o) => o
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| o.text().collect()),
                    None => continue,
                }
            }
            _ => typed.unwrap_or_else(|| el.attr("value").unwrap_or_default().to_string()),
        };

        fields.push((name, value));
    }

    let mut action = match form.value().attr("action") {
        Some(action) if !action.is_empty() => base
            .join(action)
            .map_err(|e| BrowserError::navigation(action, e))?,
        _ => base.clone(),
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
        _ => Method::GET,
    };

    // A GET submission replaces the action's query with the form data
    if method == Method::GET {
        action.set_query(None);
    }

    Ok(Submission {
        method,
        action,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_FORM: &str = r#"
        <form id="kc-form-login" action="/auth/login-actions/authenticate?session_code=abc" method="post">
            <input type="hidden" name="csrf" value="tok">
            <input id="username" name="username" type="text">
            <input id="password" name="password" type="password">
            <input type="checkbox" name="rememberMe">
            <input id="kc-login" name="login" type="submit" value="Sign In">
            <input id="kc-cancel" name="cancel" type="submit" value="Cancel">
        </form>
    "#;

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(body.to_string())
    }

    #[test]
    fn test_extract_resolves_relative_and_keeps_empty() {
        let base = Url::parse("https://example.com/app/list").unwrap();
        let html = r#"
            <a href="/app/view?id=1">View</a>
            <a>No href</a>
            <a href="https://other.host/page">Elsewhere</a>
            <a href="edit#top">Edit</a>
        "#;
        let hrefs = extract_anchor_hrefs(html, &base);
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/app/view?id=1",
                "",
                "https://other.host/page",
                "https://example.com/app/edit#top",
            ]
        );
    }

    #[test]
    fn test_submission_includes_clicked_button_only() {
        let base = Url::parse("https://sso.example.com/auth").unwrap();
        let mut filled = HashMap::new();
        filled.insert("username".to_string(), "alice".to_string());
        filled.insert("password".to_string(), "s3cret".to_string());

        let action = click_action(LOGIN_FORM, &base, "kc-login", &filled).unwrap();
        let ClickAction::Submit(form) = action else {
            panic!("expected a form submission");
        };

        assert_eq!(form.method, Method::POST);
        assert_eq!(
            form.action.as_str(),
            "https://sso.example.com/auth/login-actions/authenticate?session_code=abc"
        );
        assert_eq!(
            form.fields,
            vec![
                ("csrf".to_string(), "tok".to_string()),
                ("username".to_string(), "alice".to_string()),
                ("password".to_string(), "s3cret".to_string()),
                ("login".to_string(), "Sign In".to_string()),
            ]
        );
    }

    #[test]
    fn test_click_outside_form_is_an_error() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<button id="lonely">Go</button>"#;
        let result = click_action(html, &base, "lonely", &HashMap::new());
        assert!(matches!(result, Err(BrowserError::Protocol(_))));
    }

    #[test]
    fn test_click_missing_control() {
        let base = Url::parse("https://example.com/").unwrap();
        let result = click_action(LOGIN_FORM, &base, "nope", &HashMap::new());
        assert!(matches!(result, Err(BrowserError::ElementNotFound { id }) if id == "nope"));
    }

    #[tokio::test]
    async fn test_fill_requires_existing_control() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html_page(LOGIN_FORM))
            .mount(&server)
            .await;

        let mut browser = HttpBrowser::new().unwrap();
        browser.navigate(&format!("{}/login", server.uri())).await.unwrap();

        assert!(browser.fill("username", "alice").await.is_ok());
        let err = browser.fill("email", "alice@example.com").await.unwrap_err();
        assert!(matches!(err, BrowserError::ElementNotFound { .. }));
    }

    #[tokio::test]
    async fn test_login_session_cookie_carries_over() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(html_page(
                r#"<form action="/session" method="post">
                     <input id="username" name="username">
                     <input id="password" name="password" type="password">
                     <button id="submit" name="go" value="1">Log in</button>
                   </form>"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("password=s3cret"))
            .respond_with(
                html_page(r#"<a href="/home">Home</a>"#)
                    .insert_header("set-cookie", "session=ok; Path=/"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/home"))
            .and(header("cookie", "session=ok"))
            .respond_with(html_page(r#"<a href="/home?page=2">Next</a>"#))
            .mount(&server)
            .await;

        let mut browser = HttpBrowser::new().unwrap();
        browser.navigate(&format!("{}/login", server.uri())).await.unwrap();
        browser.fill("username", "alice").await.unwrap();
        browser.fill("password", "s3cret").await.unwrap();
        browser.click("submit").await.unwrap();

        assert_eq!(
            browser.current_url().await.unwrap(),
            format!("{}/session", server.uri())
        );

        let hrefs = browser.anchor_hrefs().await.unwrap();
        assert_eq!(hrefs, vec![format!("{}/home", server.uri())]);

        browser.navigate(&hrefs[0]).await.unwrap();
        assert_eq!(
            browser.anchor_hrefs().await.unwrap(),
            vec![format!("{}/home?page=2", server.uri())]
        );
    }

    #[test]
    fn test_get_form_replaces_action_query() {
        let base = Url::parse("https://example.com/search?page=3").unwrap();
        let html = r#"
            <form action="/results?stale=1">
                <input id="q" name="q">
                <button id="go">Search</button>
            </form>
        "#;
        let mut filled = HashMap::new();
        filled.insert("q".to_string(), "maps".to_string());

        let ClickAction::Submit(form) = click_action(html, &base, "go", &filled).unwrap() else {
            panic!("expected a form submission");
        };

        assert_eq!(form.method, Method::GET);
        assert_eq!(form.action.as_str(), "https://example.com/results");
        assert_eq!(form.fields, vec![("q".to_string(), "maps".to_string())]);
    }

    #[tokio::test]
    async fn test_error_status_still_loads_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"<h1>Not found</h1><a href="/home">Home</a>"#),
            )
            .mount(&server)
            .await;

        let mut browser = HttpBrowser::new().unwrap();
        browser.navigate(&format!("{}/gone", server.uri())).await.unwrap();

        assert_eq!(browser.current_url().await.unwrap(), format!("{}/gone", server.uri()));
        assert_eq!(
            browser.anchor_hrefs().await.unwrap(),
            vec![format!("{}/home", server.uri())]
        );
    }

    #[tokio::test]
    async fn test_unparseable_url_is_navigation_failure() {
        let mut browser = HttpBrowser::new().unwrap();
        let err = browser.navigate("not a url").await.unwrap_err();
        assert!(matches!(err, BrowserError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_dead_link_does_not_abort_crawl() {
        use crate::crawl::{Crawler, Scope};

        let server = MockServer::start().await;
        let a = format!("{}/a", server.uri());
        let b = format!("{}/b", server.uri());
        let gone = format!("{}/gone", server.uri());

        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(html_page(r#"<a href="/gone">Dead</a><a href="/b">B</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(html_page(r#"<a href="/a">Back</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut browser = HttpBrowser::new().unwrap();
        let crawler = Crawler::new(Scope::new("127.0.0.1", vec![]), Duration::ZERO);
        let report = crawler.crawl(&mut browser, &a).await.unwrap();

        assert_eq!(report.navigation_order, vec![a.clone(), gone.clone(), b.clone()]);
        let mut expected = vec![a, b, gone];
        expected.sort();
        assert_eq!(report.links, expected);
    }
}
