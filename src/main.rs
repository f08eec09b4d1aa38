//! Fresh Wallet Relay - Helius webhook → Telegram alerts for fresh-wallet buys

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

// Use the library crate
use freshies_relay::cli::commands;
use freshies_relay::config::Config;

/// Fresh Wallet Relay - alerts on fresh-wallet token buys
#[derive(Parser)]
#[command(name = "freshies")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml", env = "FRESHIES_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the webhook and start the listener
    Serve,

    /// Register the Helius webhook and exit
    RegisterWebhook,

    /// Run a saved webhook payload (JSON array) through the pipeline
    Replay {
        /// Path to the payload file
        file: PathBuf,

        /// Print alerts instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Send a test message to the configured chat
    TestAlert,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(false);
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    init_tracing(config.logging.json);

    // Execute command
    let result = match cli.command {
        Commands::Serve => commands::serve(&config).await,
        Commands::RegisterWebhook => commands::register_webhook(&config).await,
        Commands::Replay { file, dry_run } => commands::replay(&config, &file, dry_run).await,
        Commands::TestAlert => commands::test_alert(&config).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("freshies_relay=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
