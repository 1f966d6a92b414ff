//! YTDL Relay Daemon
//!
//! Local HTTP bridge between a browser extension and yt-dlp: accepts
//! download submissions on the loopback interface, validates them, and runs
//! each one as a detached, supervised yt-dlp process. Outcomes surface in
//! the server log, never in an HTTP response.

pub mod daemon;
pub mod format;
pub mod launcher;
pub mod server;
pub mod startup;
pub mod validate;
pub mod ytdlp;

pub use ytdl_relay_daemon_config as config;
pub use ytdl_relay_daemon_config::Config;

pub use daemon::{resolve_downloads_dir, Daemon, DaemonError};
pub use format::{resolve, FormatSelection, Quality};
pub use launcher::{launch, run_job, DownloadJob};
pub use server::{
    create_router, run_server, AppState, HealthResponse, ServerError, SubmitResponse,
};
pub use startup::{probe_ytdlp_version, run_startup_checks, StartupError};
pub use validate::{parse_request, DownloadRequest, ValidationError, SUPPORTED_HOST};
pub use ytdlp::{
    build_download_command, output_template, run_download, DownloadError, DownloadParams,
    DOWNLOAD_TIMEOUT,
};
