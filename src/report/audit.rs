// src/report/audit.rs
// =============================================================================
// Runs the external accessibility audit tool.
//
// The tool reads its own configuration file (the one just patched), so it
// is started with no arguments. Its output goes straight to our terminal
// and we wait for it to finish. A non-zero exit usually just means the
// audit found issues, so it is reported but not treated as our failure.
// =============================================================================

use anyhow::{Context, Result};
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{info, warn};

// Runs `command` through the platform shell and waits for it
pub async fn run_audit(command: &str) -> Result<ExitStatus> {
    info!(command, "running audit tool");

    let status = shell(command)
        .status()
        .await
        .with_context(|| format!("failed to start audit command '{}'", command))?;

    if status.success() {
        info!("audit tool finished");
    } else {
        warn!(code = ?status.code(), "audit tool exited with a failure status");
    }

    Ok(status)
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
