//! Kino CLI - Headless driver for the Kino playback runtime
//!
//! Features:
//! - Backend detection for source URLs
//! - Simulated playback sessions with retry handling
//! - Replay of recorded event logs through the reducer

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

/// Kino CLI - Playback runtime toolkit
#[derive(Parser)]
#[command(name = "kino")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Drive and inspect the Kino playback state machine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Runtime configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the playback backend for one or more URLs
    Detect {
        /// Source URLs or paths
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Play a source on a simulated video surface
    Simulate {
        /// Source URL
        url: String,

        /// Media duration in seconds
        #[arg(short, long, default_value = "60")]
        duration: f64,

        /// Video width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Video height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Seconds of playback to simulate
        #[arg(short, long, default_value = "10")]
        play_for: f64,

        /// Clock step in seconds
        #[arg(long, default_value = "1")]
        step: f64,

        /// Seek to this position after playing
        #[arg(short, long)]
        seek: Option<f64>,

        /// Make loading fail (network, decode, aborted, not-supported)
        #[arg(long)]
        fail: Option<String>,
    },

    /// Replay a JSON array of events through the reducer
    Replay {
        /// Event log file
        events: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    kino_runtime::init();

    match cli.command {
        Commands::Detect { urls } => {
            commands::detect(&urls, &cli.format)?;
        }
        Commands::Simulate {
            url,
            duration,
            width,
            height,
            play_for,
            step,
            seek,
            fail,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let options = commands::SimulateOptions {
                duration,
                width,
                height,
                play_for,
                step,
                seek,
                fail,
            };
            commands::simulate(&url, options, config, &cli.format).await?;
        }
        Commands::Replay { events } => {
            commands::replay(&events, &cli.format)?;
        }
    }

    Ok(())
}
