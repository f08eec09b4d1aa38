//! CLI command implementations

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::alert::formatter::group_digits;
use crate::alert::{AlertSink, StdoutSink, TelegramSink};
use crate::config::Config;
use crate::enrichment::{Enrichers, HeliusClient, RugcheckClient};
use crate::pipeline::Pipeline;
use crate::webhook::{self, parse_batch};

/// Reply to the test command
pub const TEST_MESSAGE: &str = "Bot active – filters applied";

/// Build the live enrichment clients
pub fn live_enrichers(config: &Config) -> Result<Enrichers> {
    let helius = HeliusClient::new(&config.helius, config.filters.fresh_wallet_max_txs)
        .context("Failed to create Helius client")?;
    let rugcheck = RugcheckClient::new(&config.rugcheck).context("Failed to create Rugcheck client")?;
    Ok(Enrichers::live(helius, rugcheck))
}

fn telegram_sink(config: &Config) -> Result<Arc<TelegramSink>> {
    if config.telegram.chat_id.is_empty() {
        anyhow::bail!("telegram.chat_id is not set (or CHAT_ID)");
    }
    let sink = TelegramSink::new(&config.telegram).context("Failed to create Telegram sink")?;
    Ok(Arc::new(sink))
}

/// Message announcing the active filters
pub fn startup_message(config: &Config) -> String {
    format!(
        "Freshies LIVE | ≥{} SOL | ≤${} MC",
        config.filters.min_sol,
        group_digits(config.filters.max_market_cap)
    )
}

/// Start the relay: register the webhook, then listen
pub async fn serve(config: &Config) -> Result<()> {
    info!("Starting fresh-wallet relay...");
    info!(
        "Filters: min {} SOL, max ${} MC, fresh < {} txs",
        config.filters.min_sol,
        group_digits(config.filters.max_market_cap),
        config.filters.fresh_wallet_max_txs
    );

    if config.helius.api_key.is_empty() {
        warn!("helius.api_key is not set - every wallet lookup will fall back to defaults");
    }

    let sink = telegram_sink(config)?;
    let pipeline = Pipeline::from_config(config, live_enrichers(config)?, sink.clone());

    if config.helius.register_on_start {
        if config.helius.webhook_url.is_empty() {
            warn!("helius.webhook_url not set - skipping webhook registration");
        } else if let Err(e) = register(config).await {
            warn!("Webhook registration failed, continuing: {}", e);
        }
    }

    if config.telegram.notify_on_start {
        if let Err(e) = sink
            .send(&config.telegram.chat_id, &startup_message(config))
            .await
        {
            warn!("Startup notification failed: {}", e);
        }
    }

    webhook::run_server(&config.server, Arc::new(pipeline)).await
}

/// Register the Helius webhook only
pub async fn register_webhook(config: &Config) -> Result<()> {
    register(config).await?;
    println!("Webhook registered for {}", config.helius.webhook_url);
    Ok(())
}

async fn register(config: &Config) -> Result<()> {
    let helius = HeliusClient::new(&config.helius, config.filters.fresh_wallet_max_txs)?;
    helius
        .register_webhook(&config.helius.webhook_url, &config.helius.account_addresses)
        .await?;
    Ok(())
}

/// Run a saved webhook payload through the pipeline
pub async fn replay(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read batch file {}", path.display()))?;
    let items: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid webhook payload in {}", path.display()))?;
    let batch = parse_batch(items);

    let sink: Arc<dyn AlertSink> = if dry_run {
        warn!("Running in DRY-RUN mode - alerts are printed, not sent");
        Arc::new(StdoutSink)
    } else {
        telegram_sink(config)?
    };

    let pipeline = Pipeline::from_config(config, live_enrichers(config)?, sink);
    let report = pipeline.process_batch(&batch).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Send a test message to the configured chat
pub async fn test_alert(config: &Config) -> Result<()> {
    let sink = telegram_sink(config)?;
    sink.send(&config.telegram.chat_id, TEST_MESSAGE).await?;
    println!("Test message sent to {}", config.telegram.chat_id);
    Ok(())
}

/// Print masked configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
