//! # terrace-sync
//!
//! CLI for the offline-first reservation sync engine.
//!
//! ## Commands
//!
//! - `reserve`: Create a reservation locally and queue it
//! - `sync`: Run one sync pass against the backend
//! - `status`: Show connectivity and pending work
//! - `list`: List local reservations
//! - `refresh`: Reload reservations from the backend
//! - `watch`: Sync automatically whenever connectivity returns
//!
//! ## Example
//!
//! ```bash
//! # Queue a visit while offline
//! terrace-sync reserve --owner user-1 --date 2026-07-04 --start 19:30
//!
//! # Push queued reservations
//! terrace-sync sync
//!
//! # Keep syncing in the background
//! terrace-sync watch
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod engine;

use commands::reserve::ReserveArgs;
use commands::{list, refresh, reserve, status, sync, watch};
use config::{Config, CONFIG_FILE};
use engine::Mode;

/// Offline-first reservation sync.
#[derive(Parser, Debug)]
#[command(name = "terrace-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the local store and configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data-dir>/terrace.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Use an in-process backend that accepts everything (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    /// Verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a reservation locally and queue it for sync
    Reserve {
        /// Owner (client user) id
        #[arg(long)]
        owner: String,

        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Start time, HH:MM
        #[arg(long)]
        start: String,

        /// End time, HH:MM
        #[arg(long)]
        end: Option<String>,

        /// Request kind: visit or event
        #[arg(long)]
        kind: Option<String>,

        /// Terrace id
        #[arg(long)]
        terrace: Option<String>,

        /// Terrace display name
        #[arg(long)]
        terrace_name: Option<String>,

        /// Number of guests
        #[arg(long)]
        guests: Option<u32>,

        /// Duration in hours
        #[arg(long)]
        duration: Option<f64>,

        /// Event type (birthday, corporate, ...)
        #[arg(long)]
        event_type: Option<String>,

        /// Notes for the host
        #[arg(long)]
        notes: Option<String>,
    },

    /// Push queued reservations to the backend
    Sync {
        /// Treat the device as offline
        #[arg(long)]
        offline: bool,
    },

    /// Show connectivity and pending work
    Status {
        /// Skip the connectivity probe
        #[arg(long)]
        offline: bool,
    },

    /// List local reservations
    List,

    /// Reload reservations from the backend, keeping unsynced ones
    Refresh {
        /// Owner whose reservations to load
        #[arg(long)]
        owner: String,
    },

    /// Sync automatically whenever connectivity returns
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let config_path = cli.config.unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let config = Config::load_or_default(&config_path)?;
    let mode = Mode {
        mock: cli.mock,
        offline: false,
    };

    match cli.command {
        Commands::Reserve {
            owner,
            date,
            start,
            end,
            kind,
            terrace,
            terrace_name,
            guests,
            duration,
            event_type,
            notes,
        } => {
            let args = ReserveArgs {
                owner,
                date,
                start,
                end,
                kind,
                terrace,
                terrace_name,
                guests,
                duration,
                event_type,
                notes,
            };
            reserve::run(&data_dir, &config, args).await?;
        }
        Commands::Sync { offline } => {
            sync::run(&data_dir, &config, Mode { offline, ..mode }).await?;
        }
        Commands::Status { offline } => {
            status::run(&data_dir, &config, Mode { offline, ..mode }).await?;
        }
        Commands::List => {
            list::run(&data_dir, &config).await?;
        }
        Commands::Refresh { owner } => {
            refresh::run(&data_dir, &config, &owner, mode).await?;
        }
        Commands::Watch => {
            watch::run(&data_dir, &config, mode).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for terrace-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "terrace-rentals", "terrace-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
