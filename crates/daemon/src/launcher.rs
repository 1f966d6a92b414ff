//! Detached download jobs
//!
//! Every accepted submission becomes one job: a single yt-dlp process
//! supervised by its own tokio task. The client has already been answered by
//! the time the process starts, so the outcome lands in the server log and
//! nowhere else. Nothing bounds how many jobs run at once, and a failed job
//! is never retried; the client resubmits if it cares.

use crate::ytdlp::{build_download_command, run_download, DownloadError, DownloadParams};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// One in-flight yt-dlp invocation
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Correlates the job's log lines; never returned to the client
    pub id: String,
    /// The URL being fetched
    pub url: String,
    /// Format label for log lines
    pub format: String,
    /// When the job was accepted
    pub started_at: Instant,
}

impl DownloadJob {
    /// Create a job record for an accepted submission
    pub fn new(url: String, format: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            format,
            started_at: Instant::now(),
        }
    }
}

/// Render the argv for the start-of-job log line
fn command_line(params: &DownloadParams) -> String {
    let cmd = build_download_command(params);
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run one job to completion, logging the start line and the terminal outcome
///
/// Returns the outcome for callers that want to await it; the request path
/// goes through [`launch`] and discards it after it is logged.
pub async fn run_job(job: DownloadJob, params: DownloadParams) -> Result<(), DownloadError> {
    info!(
        url = %job.url,
        format = %job.format,
        cmd = %command_line(&params),
        "starting download"
    );

    let result = run_download(&params).await;
    let elapsed = job.started_at.elapsed().as_secs();

    match &result {
        Ok(()) => info!(elapsed_secs = elapsed, url = %job.url, "download complete"),
        Err(e) => error!(elapsed_secs = elapsed, url = %job.url, "download failed: {e}"),
    }

    result
}

/// Launch a job as a detached task
///
/// The task owns the child process and keeps running after the HTTP response
/// has gone out. The handle is returned for callers that need to join it;
/// the request path drops it.
pub fn launch(job: DownloadJob, params: DownloadParams) -> JoinHandle<Result<(), DownloadError>> {
    let span = info_span!("download", job = %job.id);
    tokio::spawn(run_job(job, params).instrument(span))
}
