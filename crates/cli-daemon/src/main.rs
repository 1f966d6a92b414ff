//! CLI entry point for the YTDL Relay Daemon
//!
//! Parses command line arguments and starts the daemon.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use ytdl_relay_daemon::config::ConfigError;
use ytdl_relay_daemon::{Config, Daemon, DaemonError, StartupError};

/// YTDL Relay Daemon - local bridge between the browser extension and yt-dlp
#[derive(Parser, Debug)]
#[command(name = "ytdl-relay-daemon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file. Without this flag, config.toml is
    /// read if present and built-in defaults apply otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Download destination, overriding the config file and the default
    /// Downloads directory
    #[arg(short, long)]
    downloads_dir: Option<PathBuf>,

    /// Skip the yt-dlp startup probe. For testing only.
    #[arg(long, default_value = "false")]
    skip_checks: bool,
}

/// Load configuration, honoring --config and --downloads-dir
///
/// An explicit --config path must exist; the implicit default may be absent.
fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default("config.toml")?,
    };

    if let Some(dir) = &args.downloads_dir {
        config.downloads.dir = Some(dir.clone());
    }

    Ok(config)
}

/// How to get yt-dlp on each platform
fn print_install_hints() {
    eprintln!("Install it first:");
    eprintln!("  macOS:   brew install yt-dlp");
    eprintln!("  Linux:   sudo apt install yt-dlp  OR  pip install yt-dlp");
    eprintln!("  Windows: winget install yt-dlp  OR  pip install yt-dlp");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    println!("YTDL Relay Daemon starting...");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize the daemon
    let daemon_result = if args.skip_checks {
        println!("WARNING: Skipping startup checks (--skip-checks enabled)");
        Ok(Daemon::new_without_checks(config))
    } else {
        Daemon::with_config(config)
    };

    match daemon_result {
        Ok(daemon) => {
            if !args.skip_checks {
                println!("yt-dlp version: {}", daemon.ytdlp_version);
            }
            println!("Downloads directory: {}", daemon.downloads_dir.display());
            println!(
                "Server running at http://127.0.0.1:{}",
                daemon.config.server.port
            );
            println!("Waiting for requests from the browser extension...");

            if let Err(e) = daemon.run().await {
                eprintln!("Daemon error: {}", e);
                return ExitCode::FAILURE;
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to initialize daemon: {}", e);
            if matches!(
                e,
                DaemonError::Startup(StartupError::ToolUnavailable(_))
            ) {
                print_install_hints();
            }
            ExitCode::FAILURE
        }
    }
}
