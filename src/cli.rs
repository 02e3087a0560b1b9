// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two modes, one subcommand each:
// - crawl:  log in, discover every page, write them into the audit config,
//           run the audit
// - report: just run the audit against whatever the config already says
//
// Credentials never go on the command line: they come from AUDIT_USERNAME
// and AUDIT_PASSWORD (a .env file in the working directory is loaded first).
// =============================================================================

use crate::auth::{Credentials, LoginForm};
use crate::browser::Driver;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "audit-crawler",
    version,
    about = "Crawl a logged-in web app and run an accessibility audit over every page",
    long_about = "audit-crawler logs into a web application, walks every same-origin page reachable \
                  through links, writes the page list into the audit tool's configuration file and \
                  then runs the audit tool."
)]
pub struct Cli {
    /// Log every crawl decision (same as RUST_LOG=audit_crawler=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, crawl the site, patch the audit config and run the audit
    ///
    /// Example: audit-crawler crawl https://app.example.com/ --config-file .pa11yci
    Crawl(CrawlArgs),

    /// Skip crawling and run the audit with the config as it is
    ///
    /// Example: audit-crawler report --audit-command "pa11y-ci"
    Report {
        #[command(flatten)]
        report: ReportArgs,
    },
}

/// Where the URL list goes and what runs afterwards.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Configuration file the audit tool reads
    #[arg(long, default_value = ".pa11yci")]
    pub config_file: PathBuf,

    /// 1-based line of the config file that holds the URL list
    #[arg(long, default_value_t = 22)]
    pub line: usize,

    /// Command that runs the audit (passed to the shell, no arguments added)
    #[arg(long, default_value = "pa11y-ci")]
    pub audit_command: String,
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Page to start from; normally redirects to the login form
    pub start_url: String,

    /// Host substring a URL must contain to be crawled (default: START_URL's host)
    #[arg(long)]
    pub host: Option<String>,

    /// Never follow or report URLs containing this text (repeatable)
    #[arg(long = "skip-marker", default_value = "logout")]
    pub skip_markers: Vec<String>,

    /// Milliseconds to wait after each page load before reading its links
    #[arg(long, default_value_t = 1000)]
    pub settle_ms: u64,

    /// Browser engine: chrome renders JavaScript, http only fetches HTML
    #[arg(long, value_enum, default_value_t = Driver::Chrome)]
    pub driver: Driver,

    /// Show the browser window (chrome driver only)
    #[arg(long)]
    pub headful: bool,

    /// Element id of the username input
    #[arg(long, default_value = "username")]
    pub username_field: String,

    /// Element id of the password input
    #[arg(long, default_value = "password")]
    pub password_field: String,

    /// Element id of the submit control
    #[arg(long, default_value = "kc-login")]
    pub submit_field: String,

    /// Start crawling without logging in
    #[arg(long)]
    pub no_login: bool,

    /// Only crawl: leave the config file alone and don't run the audit
    #[arg(long)]
    pub no_report: bool,

    /// Print the crawl result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl CrawlArgs {
    pub fn login_form(&self) -> LoginForm {
        LoginForm {
            username_id: self.username_field.clone(),
            password_id: self.password_field.clone(),
            submit_id: self.submit_field.clone(),
        }
    }

    /// Credentials to log in with, or None when login is switched off.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        if self.no_login {
            return Ok(None);
        }
        Credentials::from_env().map(Some)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
