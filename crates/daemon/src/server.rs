//! HTTP server for the YTDL Relay Daemon
//!
//! Three surfaces: a health check for the extension's connectivity badge,
//! the submission endpoint, and a JSON 404 for everything else. Every
//! response carries permissive CORS headers so the extension can call the
//! daemon from any page, and OPTIONS preflights are answered before routing.

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::format;
use crate::launcher::{self, DownloadJob};
use crate::validate::{self, DownloadRequest};
use crate::ytdlp::{output_template, DownloadParams, DOWNLOAD_TIMEOUT};

/// Version reported by the health endpoint
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Acknowledgment message sent before the job has done anything
const QUEUED_MESSAGE: &str = "Download queued! Check your terminal.";

/// Errors that can occur when running the relay server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),
}

/// Immutable per-process state handed to request handlers
///
/// Assembled once at startup; handlers only read it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// yt-dlp executable path
    pub ytdlp_bin: PathBuf,
    /// Where finished downloads land
    pub downloads_dir: PathBuf,
    /// Wall-clock budget per job
    pub job_timeout: Duration,
}

impl AppState {
    /// State with the production download timeout
    pub fn new(ytdlp_bin: PathBuf, downloads_dir: PathBuf) -> Self {
        Self {
            ytdlp_bin,
            downloads_dir,
            job_timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

/// Body of GET /health responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of POST /submit responses and of the JSON 404
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitResponse {
    fn queued() -> Self {
        Self {
            success: true,
            message: Some(QUEUED_MESSAGE.to_string()),
            error: None,
        }
    }

    fn rejected(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

/// Handler for GET /health
/// Confirms the daemon is up without touching yt-dlp
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}

/// Handler for POST /submit
///
/// Validates the payload, fires the detached job, and acknowledges before
/// the download has made any progress. Everything after the 200 is only
/// visible in the server log.
async fn submit(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<SubmitResponse>) {
    let request = match validate::parse_request(&body) {
        Ok(request) => request,
        Err(e) => {
            info!("rejected submission: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse::rejected(e.to_string())),
            );
        }
    };

    info!(url = %request.url, format = %request.format_label(), "accepted submission");
    launch_job(&state, &request);

    (StatusCode::OK, Json(SubmitResponse::queued()))
}

/// Resolve the format and fire the detached yt-dlp job for a valid request
fn launch_job(state: &AppState, request: &DownloadRequest) {
    let selection = format::resolve(request.quality(), request.audio_only);
    let params = DownloadParams::with_timeout(
        state.ytdlp_bin.clone(),
        selection,
        output_template(&state.downloads_dir),
        request.url.clone(),
        state.job_timeout,
    );
    let job = DownloadJob::new(request.url.clone(), request.format_label().to_string());

    // Detached: the JoinHandle is dropped, the outcome goes to the log
    launcher::launch(job, params);
}

/// JSON 404 for unknown paths and unmatched methods
async fn not_found() -> (StatusCode, Json<SubmitResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(SubmitResponse::rejected("Not found".to_string())),
    )
}

fn apply_cors_headers(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
}

/// CORS middleware for the browser extension
///
/// OPTIONS on any path is answered 204 with no body before routing; every
/// other response gets the same three headers attached on the way out.
async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(&mut response);
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(&mut response);
    response
}

/// Creates the axum Router with all endpoints and the CORS middleware
///
/// Unmatched methods on known paths fall through to the same JSON 404 as
/// unknown paths; the extension treats anything but the documented shapes
/// as "daemon not running".
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/submit", post(submit).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Runs the relay HTTP server on 127.0.0.1:<port>
///
/// Loopback only: the daemon is a local bridge and must not be reachable
/// from other hosts.
///
/// # Arguments
/// * `state` - Startup state handed to request handlers
/// * `port` - Loopback TCP port to bind
///
/// # Returns
/// * `Ok(())` if the server shuts down gracefully
/// * `Err(ServerError)` if binding or serving fails
pub async fn run_server(state: AppState, port: u16) -> Result<(), ServerError> {
    let app = create_router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(ServerError::Bind)?;

    Ok(())
}
