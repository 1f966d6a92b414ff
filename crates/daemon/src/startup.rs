//! Startup checks module for the YTDL Relay Daemon
//!
//! Preflight verification that the daemon can actually do its job before the
//! listener comes up: the configured yt-dlp binary must exist and answer a
//! version probe. Refusing to start beats accepting submissions that every
//! job would fail.

use crate::config::Config;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("yt-dlp not available: {0}")]
    ToolUnavailable(String),
}

/// Probe the yt-dlp binary and return its reported version
///
/// Runs `<bin> --version`; the trimmed stdout is the version string. yt-dlp
/// prints a single date-based line like `2025.01.15`.
pub fn probe_ytdlp_version(bin: &Path) -> Result<String, StartupError> {
    let output = Command::new(bin).arg("--version").output().map_err(|e| {
        StartupError::ToolUnavailable(format!(
            "{} --version failed; is yt-dlp installed and in PATH? Error: {}",
            bin.display(),
            e
        ))
    })?;

    if !output.status.success() {
        return Err(StartupError::ToolUnavailable(format!(
            "{} --version exited with {}",
            bin.display(),
            output.status
        )));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err(StartupError::ToolUnavailable(format!(
            "{} --version produced no output",
            bin.display()
        )));
    }

    Ok(version)
}

/// Run all startup checks and return the detected yt-dlp version
pub fn run_startup_checks(cfg: &Config) -> Result<String, StartupError> {
    probe_ytdlp_version(&cfg.ytdlp.bin)
}
