// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Load .env, parse command-line arguments, set up logging
// 2. Pick the mode:
//      report: run the audit tool and stop
//      crawl:  launch browser -> log in -> crawl -> patch config -> audit
// 3. Always release the browser, whether the run succeeded or not
// 4. Exit with proper code (0 = success, 2 = error)
//
// Logs go to stderr; stdout is reserved for the result (table or --json).
// =============================================================================

mod auth;
mod browser;
mod cli;
mod crawl;
mod report;

use anyhow::{Context, Result};
use browser::{Browser, LaunchOptions};
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs, ReportArgs};
use crawl::{CrawlReport, Crawler, Scope};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    // Pick up AUDIT_USERNAME / AUDIT_PASSWORD from .env before clap reads the env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Report { report: args } => handle_report(&args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "audit_crawler=debug"
    } else {
        "audit_crawler=info"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

// Report-only mode
async fn handle_report(args: &ReportArgs) -> Result<i32> {
    info!(config = %args.config_file.display(), "report only: skipping crawl");
    report::run_audit(&args.audit_command).await?;
    Ok(0)
}

// Scrape-then-report mode
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    // Settle everything that can fail without a browser first
    let credentials = args.credentials()?;
    let scope = Scope::for_start_url(&args.start_url, args.host.as_deref(), args.skip_markers.clone())?;

    let options = LaunchOptions {
        headful: args.headful,
    };
    let mut session = browser::launch(args.driver, &options)
        .await
        .context("failed to start browser session")?;

    let outcome = scrape_and_report(session.as_mut(), &args, scope, credentials).await;

    if let Err(e) = session.quit().await {
        warn!("failed to close browser session: {}", e);
    }

    outcome
}

async fn scrape_and_report(
    session: &mut dyn Browser,
    args: &CrawlArgs,
    scope: Scope,
    credentials: Option<auth::Credentials>,
) -> Result<i32> {
    session
        .navigate(&args.start_url)
        .await
        .context("failed to open start page")?;

    if let Some(credentials) = &credentials {
        auth::login(session, &args.login_form(), credentials)
            .await
            .context("login failed")?;
    }

    let crawler = Crawler::new(scope, args.settle());
    let result = crawler
        .crawl(session, &args.start_url)
        .await
        .context("crawl aborted")?;

    print_result(&result, args.json)?;

    if args.no_report {
        return Ok(0);
    }

    let line = report::format_url_line(&result.links);
    report::replace_line(&args.report.config_file, args.report.line, &line)?;
    info!(
        config = %args.report.config_file.display(),
        line = args.report.line,
        urls = result.links.len(),
        "audit config updated"
    );

    report::run_audit(&args.report.audit_command).await?;
    Ok(0)
}

fn print_result(result: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for link in &result.links {
        println!("  {}", link);
    }
    println!();
    println!("📊 Summary:");
    println!("   📄 Pages visited: {}", result.pages_visited);
    println!("   🔗 URLs for audit: {}", result.links.len());
    Ok(())
}
