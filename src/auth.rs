// src/auth.rs
// =============================================================================
// This module logs into the application through its login form.
//
// It assumes the browser is already showing the login page (the crawl's
// start URL normally redirects there when there is no session). It fills
// the username and password controls and clicks submit. Every control is
// looked up by element id. A missing control is an error and there is no
// retry: if the login page changed, the crawl should stop rather than
// explore the site logged out.
// =============================================================================

use crate::browser::{Browser, BrowserError};
use anyhow::{bail, Result};
use std::env;
use std::fmt;
use tracing::info;

/// Element ids of the three login controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username_id: String,
    pub password_id: String,
    pub submit_id: String,
}

impl Default for LoginForm {
    // Keycloak's stock login theme
    fn default() -> Self {
        Self {
            username_id: "username".to_string(),
            password_id: "password".to_string(),
            submit_id: "kc-login".to_string(),
        }
    }
}

pub const USERNAME_VAR: &str = "AUDIT_USERNAME";
pub const PASSWORD_VAR: &str = "AUDIT_PASSWORD";

// Only ever read from the environment: a password given as a command-line
// argument is visible to every user through the process list.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Reads AUDIT_USERNAME and AUDIT_PASSWORD.
    pub fn from_env() -> Result<Self> {
        Self::from_values(env::var(USERNAME_VAR).ok(), env::var(PASSWORD_VAR).ok())
    }

    fn from_values(username: Option<String>, password: Option<String>) -> Result<Self> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => bail!(
                "{} and {} must be set (or pass --no-login)",
                USERNAME_VAR,
                PASSWORD_VAR
            ),
        }
    }
}

// Never print the password, not even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// Fills in the login form on the current page and submits it
pub async fn login(
    browser: &mut dyn Browser,
    form: &LoginForm,
    credentials: &Credentials,
) -> Result<(), BrowserError> {
    info!(user = %credentials.username, "logging in");

    browser.fill(&form.username_id, &credentials.username).await?;
    browser.fill(&form.password_id, &credentials.password).await?;
    browser.click(&form.submit_id).await?;

    info!(landed_on = %browser.current_url().await?, "login submitted");
    Ok(())
}
