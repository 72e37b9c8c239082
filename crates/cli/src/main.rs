//! Anxiousroid CLI — the main entry point.
//!
//! Commands:
//! - `serve`          — Start the HTTP chat API
//! - `chat`           — Run a single chat turn from the terminal
//! - `catalog check`  — Load the term and rule catalogs and report counts
//! - `history`        — Print a user's recent conversation

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "anxiousroid",
    about = "Anxiousroid — an anxious angel chat proxy",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = anxiousroid_config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat API
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message and print the reply
    Chat {
        /// User the turn belongs to
        #[arg(short, long)]
        user: String,

        /// Platform recorded with the turn
        #[arg(long, default_value = "cli")]
        platform: String,

        /// The message text
        message: String,
    },

    /// Catalog maintenance
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Show a user's recent conversation
    History {
        #[arg(short, long)]
        user: String,

        /// Number of messages (defaults to the configured window)
        #[arg(short, long)]
        window: Option<usize>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Load both catalogs and validate every pattern
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = commands::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat {
            user,
            platform,
            message,
        } => commands::chat::run(config, &user, &platform, &message).await?,
        Commands::Catalog {
            action: CatalogAction::Check,
        } => commands::catalog::check(&config)?,
        Commands::History { user, window } => commands::history::run(&config, &user, window).await?,
    }

    Ok(())
}
