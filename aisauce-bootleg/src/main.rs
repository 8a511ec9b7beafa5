//! bootleg - download, tag and file bootlegs from SoundCloud and YouTube
//!
//! Runs a single download from the command line, or serves the HTTP API with
//! a background worker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;

use aisauce_bootleg::config::{BootlegConfig, BootlegToml, CliOverrides, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use aisauce_bootleg::models::{DownloadRecord, DownloadStatus};
use aisauce_bootleg::workflow::DownloadQueue;
use aisauce_bootleg::AppState;
use aisauce_common::config::{load_toml, resolve_config_path};
use aisauce_common::logging::init_tracing;

/// Command-line arguments for bootleg
#[derive(Parser, Debug)]
#[command(name = "bootleg")]
#[command(about = "Download, tag and file bootlegs from SoundCloud and YouTube")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config_dir>/aisauce/bootleg.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library inbox that finished tracks are moved into
    #[arg(short, long, global = true)]
    base_path: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Parent directory for temporary downloads
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    /// What to do when a destination file exists: overwrite, fail or rename
    #[arg(long, global = true)]
    on_collision: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download one or more URLs now
    Download {
        /// SoundCloud or YouTube URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// URL that receives a JSON summary when the download ends
        #[arg(long)]
        callback_url: Option<String>,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<String>,

        /// Seconds before a running download is abandoned
        #[arg(long)]
        job_timeout: Option<u64>,
    },

    /// Print the resolved configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR, CONFIG_FILE_NAME);
    let toml: BootlegToml = load_toml(config_path.as_deref()).context("Failed to load config file")?;

    let mut cli = CliOverrides {
        download_base_path: args.base_path.clone(),
        database_path: args.database.clone(),
        temp_dir: args.temp_dir.clone(),
        on_collision: args.on_collision.clone(),
        ..CliOverrides::default()
    };
    if let Command::Serve { listen, job_timeout } = &args.command {
        cli.listen_addr = listen.clone();
        cli.job_timeout_secs = *job_timeout;
    }

    init_tracing(&toml.logging);
    let config = BootlegConfig::from_env(&cli, toml).context("Invalid configuration")?;

    info!(
        "bootleg {} ({}, {} build {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    match args.command {
        Command::Download { urls, callback_url } => download(&config, &urls.join(" "), callback_url).await,
        Command::Serve { .. } => serve(config).await,
        Command::CheckConfig => {
            println!("{:#?}", config);
            Ok(())
        }
    }
}

async fn download(config: &BootlegConfig, urls: &str, callback_url: Option<String>) -> Result<()> {
    let db = aisauce_bootleg::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    let runner = aisauce_bootleg::build_runner(config, db);

    let mut record = DownloadRecord::new(urls, callback_url);
    let status = runner.run_with_timeout(&mut record, config.job_timeout).await;

    println!("{}", record.title);
    for track in &record.tracks {
        match (&track.path, &track.error) {
            (Some(path), _) => println!("  ok    {} ({})", path.display(), track.size.as_deref().unwrap_or("?")),
            (None, Some(error)) => println!("  fail  {}: {}", track.url, error),
            (None, None) => println!("  ?     {}", track.url),
        }
    }

    if status == DownloadStatus::Failed {
        bail!("{} of {} tracks failed", record.failed_count(), record.total_tracks);
    }
    Ok(())
}

async fn serve(config: BootlegConfig) -> Result<()> {
    info!("Database: {}", config.database_path.display());
    let db = aisauce_bootleg::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    let runner = Arc::new(aisauce_bootleg::build_runner(&config, db.clone()));
    let (queue, worker) = DownloadQueue::start(runner, config.job_timeout);

    let app = aisauce_bootleg::build_router(AppState::new(db, queue));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    worker.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
