//! Daemon startup and main loop for the YTDL Relay Daemon
//!
//! Provides the daemon entry point: configuration, the yt-dlp preflight
//! probe, download directory resolution, and the serve loop.

use crate::config::{Config, ConfigError};
use crate::server::{run_server, AppState, ServerError};
use crate::startup::{run_startup_checks, StartupError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Error type for daemon operations
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Startup check failed
    #[error("Startup check failed: {0}")]
    Startup(#[from] StartupError),

    /// Server error
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Daemon state assembled once at startup
///
/// Everything request handlers need is computed here and then only read;
/// there is no shared mutable state behind the HTTP surface.
pub struct Daemon {
    /// Configuration loaded from file and environment
    pub config: Config,
    /// Version reported by the yt-dlp preflight probe
    pub ytdlp_version: String,
    /// Resolved download destination
    pub downloads_dir: PathBuf,
}

impl Daemon {
    /// Initialize the daemon with configuration from file
    ///
    /// This performs the full startup sequence:
    /// 1. Load config from file and apply environment overrides
    /// 2. Probe the yt-dlp binary
    /// 3. Resolve the download destination
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self, DaemonError> {
        let config = Config::load(config_path)?;
        Self::with_config(config)
    }

    /// Initialize the daemon with an existing configuration
    ///
    /// Useful for testing or when configuration is already loaded.
    pub fn with_config(config: Config) -> Result<Self, DaemonError> {
        let ytdlp_version = run_startup_checks(&config)?;
        let downloads_dir = resolve_downloads_dir(&config);

        Ok(Self {
            config,
            ytdlp_version,
            downloads_dir,
        })
    }

    /// Initialize the daemon without running startup checks
    ///
    /// Useful for testing when yt-dlp is not available.
    pub fn new_without_checks(config: Config) -> Self {
        let downloads_dir = resolve_downloads_dir(&config);

        Self {
            config,
            ytdlp_version: "unknown".to_string(),
            downloads_dir,
        }
    }

    /// Router state for the HTTP server
    pub fn state(&self) -> AppState {
        AppState::new(self.config.ytdlp.bin.clone(), self.downloads_dir.clone())
    }

    /// Serve requests until the process is terminated
    ///
    /// There is no graceful-shutdown path; killing the process also kills
    /// in-flight yt-dlp children, which matches running the tool by hand.
    pub async fn run(&self) -> Result<(), DaemonError> {
        info!(
            ytdlp_version = %self.ytdlp_version,
            downloads_dir = %self.downloads_dir.display(),
            "starting relay daemon"
        );

        run_server(self.state(), self.config.server.port).await?;

        Ok(())
    }
}

/// Pick the download destination
///
/// An explicit config value wins; otherwise the user's Downloads directory,
/// falling back to the working directory on platforms where that cannot be
/// determined.
pub fn resolve_downloads_dir(config: &Config) -> PathBuf {
    config
        .downloads
        .dir
        .clone()
        .unwrap_or_else(|| dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
}
