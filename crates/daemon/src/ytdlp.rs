//! yt-dlp invocation for the YTDL Relay Daemon
//!
//! Provides functionality to build and execute yt-dlp download commands.
//! yt-dlp is treated as a black box: the daemon hands it format flags, an
//! output template and a URL, then consumes nothing back but the exit code.
//! Child output is forwarded line by line into the server log so progress is
//! visible in the terminal.

use crate::format::FormatSelection;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

/// Wall-clock ceiling for a single yt-dlp run; the child is killed when the
/// budget elapses
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Error type for download operations
#[derive(Debug, Error)]
pub enum DownloadError {
    /// yt-dlp exited with non-zero status
    #[error("yt-dlp exited with code {0}")]
    ExitStatus(i32),

    /// yt-dlp was terminated by a signal
    #[error("yt-dlp was terminated by a signal")]
    Terminated,

    /// The run exceeded its wall-clock budget and was killed
    #[error("yt-dlp timed out after {0}s and was killed")]
    TimedOut(u64),

    /// yt-dlp could not be started at all
    #[error("Failed to start yt-dlp: {0}")]
    Spawn(std::io::Error),

    /// IO error while supervising the child
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parameters for a single yt-dlp invocation
#[derive(Debug, Clone)]
pub struct DownloadParams {
    /// Path to the yt-dlp executable; a bare name is resolved via PATH
    pub bin: PathBuf,
    /// Resolved format-selection flags
    pub format: FormatSelection,
    /// Output path template handed to `--output`
    pub output_template: PathBuf,
    /// The video page URL, always the final argument
    pub url: String,
    /// Wall-clock budget for the whole run
    pub timeout: Duration,
}

impl DownloadParams {
    /// Create download parameters with the production timeout
    pub fn new(
        bin: PathBuf,
        format: FormatSelection,
        output_template: PathBuf,
        url: String,
    ) -> Self {
        Self::with_timeout(bin, format, output_template, url, DOWNLOAD_TIMEOUT)
    }

    /// Create download parameters with an explicit timeout
    pub fn with_timeout(
        bin: PathBuf,
        format: FormatSelection,
        output_template: PathBuf,
        url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            bin,
            format,
            output_template,
            url,
            timeout,
        }
    }
}

/// Output template for a downloads directory
///
/// yt-dlp substitutes the video title and container extension, so each
/// download lands as `<dir>/<title>.<ext>`. Two videos with the same title
/// still collide; that matches how the tool behaves when run by hand.
pub fn output_template(downloads_dir: &Path) -> PathBuf {
    downloads_dir.join("%(title)s.%(ext)s")
}

/// Build a yt-dlp command for one download
///
/// Argument order: format-selection flags, playlist suppression, the output
/// template, then the URL as the final argument. The argv is handed to the
/// process directly; nothing passes through a shell.
pub fn build_download_command(params: &DownloadParams) -> Command {
    let mut cmd = Command::new(&params.bin);

    for arg in params.format.args() {
        cmd.arg(arg);
    }

    // A watch URL with a playlist parameter would otherwise fetch the whole list
    cmd.arg("--no-playlist");

    cmd.arg("--output").arg(&params.output_template);
    cmd.arg(&params.url);

    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    cmd
}

/// Forward one child stream into the log, line by line
fn forward_lines<R>(stream: R, is_stderr: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let forward = async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if is_stderr {
                warn!(target: "ytdlp", "{line}");
            } else {
                info!(target: "ytdlp", "{line}");
            }
        }
    };

    tokio::spawn(forward.in_current_span())
}

/// Run yt-dlp to completion, forwarding its output into the log
///
/// Resolves when the child exits, fails to spawn, or is killed at the
/// timeout. The exit code is the only success signal consumed; file names
/// and sizes stay in the log output.
///
/// # Errors
/// * `DownloadError::Spawn` if the binary cannot be started
/// * `DownloadError::ExitStatus` / `Terminated` for abnormal exits
/// * `DownloadError::TimedOut` if the deadline passes and the child is killed
pub async fn run_download(params: &DownloadParams) -> Result<(), DownloadError> {
    let mut cmd = build_download_command(params);

    let mut child = cmd.spawn().map_err(DownloadError::Spawn)?;

    let stdout_task = child.stdout.take().map(|s| forward_lines(s, false));
    let stderr_task = child.stderr.take().map(|s| forward_lines(s, true));

    let result = match tokio::time::timeout(params.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            if status.success() {
                Ok(())
            } else {
                match status.code() {
                    Some(code) => Err(DownloadError::ExitStatus(code)),
                    None => Err(DownloadError::Terminated),
                }
            }
        }
        Ok(Err(e)) => Err(DownloadError::Io(e)),
        Err(_) => {
            let _ = child.kill().await;
            // Descendants of the killed child (ffmpeg during a merge) inherit
            // the pipe write ends, so the forwarders may never see EOF. Cancel
            // them rather than wait out an orphan.
            if let Some(task) = &stdout_task {
                task.abort();
            }
            if let Some(task) = &stderr_task {
                task.abort();
            }
            Err(DownloadError::TimedOut(params.timeout.as_secs()))
        }
    };

    // Let the forwarders drain whatever the pipes still hold; cancelled
    // forwarders resolve immediately
    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    result
}
