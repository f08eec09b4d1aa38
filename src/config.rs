//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub helius: HeliusConfig,
    #[serde(default)]
    pub rugcheck: RugcheckConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    /// Program id → router name. A list of tables rather than a map so that
    /// base58 keys keep their case through the config layers.
    #[serde(default = "default_routers")]
    pub routers: Vec<RouterEntry>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Process the batch before acknowledging the webhook
    #[serde(default)]
    pub process_inline: bool,
    /// Token transfers of one transaction evaluated concurrently
    #[serde(default = "default_max_concurrent_transfers")]
    pub max_concurrent_transfers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeliusConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_helius_url")]
    pub rest_base_url: String,
    #[serde(default = "default_helius_timeout_ms")]
    pub timeout_ms: u64,
    /// Public URL Helius should deliver webhooks to
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_true")]
    pub register_on_start: bool,
    /// Addresses the webhook should watch
    #[serde(default)]
    pub account_addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RugcheckConfig {
    #[serde(default = "default_rugcheck_url")]
    pub base_url: String,
    #[serde(default = "default_rugcheck_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_url")]
    pub api_base_url: String,
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    #[serde(default = "default_telegram_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub notify_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Minimum SOL the buyer must receive in the same transaction
    #[serde(default = "default_min_sol")]
    pub min_sol: f64,
    /// Maximum market cap (USD) of the bought token
    #[serde(default = "default_max_market_cap")]
    pub max_market_cap: u64,
    /// A wallet with fewer transactions than this is "fresh"
    #[serde(default = "default_fresh_wallet_max_txs")]
    pub fresh_wallet_max_txs: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_dedup_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouterEntry {
    pub program_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

/// Jupiter v6 aggregator program
pub const JUPITER_V6_PROGRAM_ID: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_max_concurrent_transfers() -> usize {
    4
}

fn default_helius_url() -> String {
    "https://api.helius.xyz".to_string()
}

fn default_helius_timeout_ms() -> u64 {
    10_000
}

fn default_rugcheck_url() -> String {
    "https://api.rugcheck.xyz".to_string()
}

fn default_rugcheck_timeout_ms() -> u64 {
    3_000
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_parse_mode() -> String {
    "Markdown".to_string()
}

fn default_telegram_timeout_ms() -> u64 {
    10_000
}

fn default_min_sol() -> f64 {
    0.33
}

fn default_max_market_cap() -> u64 {
    1_300_000
}

fn default_fresh_wallet_max_txs() -> u32 {
    10
}

fn default_dedup_ttl_secs() -> u64 {
    86_400
}

fn default_dedup_max_entries() -> usize {
    200_000
}

fn default_routers() -> Vec<RouterEntry> {
    vec![RouterEntry {
        program_id: JUPITER_V6_PROGRAM_ID.to_string(),
        name: "Jupiter".to_string(),
    }]
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            webhook_path: default_webhook_path(),
            process_inline: false,
            max_concurrent_transfers: default_max_concurrent_transfers(),
        }
    }
}

impl Default for HeliusConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            rest_base_url: default_helius_url(),
            timeout_ms: default_helius_timeout_ms(),
            webhook_url: String::new(),
            register_on_start: true,
            account_addresses: Vec::new(),
        }
    }
}

impl Default for RugcheckConfig {
    fn default() -> Self {
        Self {
            base_url: default_rugcheck_url(),
            timeout_ms: default_rugcheck_timeout_ms(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base_url: default_telegram_url(),
            parse_mode: default_parse_mode(),
            timeout_ms: default_telegram_timeout_ms(),
            notify_on_start: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_sol: default_min_sol(),
            max_market_cap: default_max_market_cap(),
            fresh_wallet_max_txs: default_fresh_wallet_max_txs(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl_secs(),
            max_entries: default_dedup_max_entries(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("filters.min_sol", default_min_sol())?
            .set_default("filters.max_market_cap", default_max_market_cap() as i64)?
            .set_default("dedup.ttl_secs", default_dedup_ttl_secs() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix FRESHIES_)
            .add_source(
                config::Environment::with_prefix("FRESHIES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.apply_env_fallbacks();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Fill secrets from the plain env vars used by earlier deployments
    fn apply_env_fallbacks(&mut self) {
        fill_from_env(&mut self.helius.api_key, "HELIUS_API_KEY");
        fill_from_env(&mut self.helius.webhook_url, "WEBHOOK_URL");
        fill_from_env(&mut self.telegram.bot_token, "BOT_TOKEN");
        fill_from_env(&mut self.telegram.chat_id, "CHAT_ID");
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.filters.min_sol.is_finite() || self.filters.min_sol < 0.0 {
            anyhow::bail!("filters.min_sol must be a non-negative number");
        }

        if self.filters.max_market_cap == 0 {
            anyhow::bail!("filters.max_market_cap must be positive");
        }

        if self.filters.fresh_wallet_max_txs == 0 {
            anyhow::bail!("filters.fresh_wallet_max_txs must be positive");
        }

        if self.dedup.ttl_secs == 0 {
            anyhow::bail!("dedup.ttl_secs must be positive");
        }

        if self.dedup.max_entries == 0 {
            anyhow::bail!("dedup.max_entries must be positive");
        }

        if self.server.max_concurrent_transfers == 0 {
            anyhow::bail!("server.max_concurrent_transfers must be positive");
        }

        if !self.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "server.webhook_path must start with '/', got {}",
                self.server.webhook_path
            );
        }

        if self.rugcheck.timeout_ms == 0 || self.helius.timeout_ms == 0 {
            anyhow::bail!("upstream timeouts must be positive");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        let routers: Vec<String> = self
            .routers
            .iter()
            .map(|r| format!("{} => {}", r.program_id, r.name))
            .collect();

        format!(
            r#"Configuration:
  Server:
    bind_addr: {}
    webhook_path: {}
    process_inline: {}
    max_concurrent_transfers: {}
  Helius:
    rest_base_url: {}
    api_key: {}
    webhook_url: {}
    register_on_start: {}
  Rugcheck:
    base_url: {}
    timeout: {}ms
  Telegram:
    bot_token: {}
    chat_id: {}
    parse_mode: {}
  Filters:
    min_sol: {} SOL
    max_market_cap: ${}
    fresh_wallet_max_txs: {}
  Dedup:
    ttl: {}s
    max_entries: {}
  Routers: {:?}
"#,
            self.server.bind_addr,
            self.server.webhook_path,
            self.server.process_inline,
            self.server.max_concurrent_transfers,
            mask_url(&self.helius.rest_base_url),
            mask_secret(&self.helius.api_key),
            mask_url(&self.helius.webhook_url),
            self.helius.register_on_start,
            self.rugcheck.base_url,
            self.rugcheck.timeout_ms,
            mask_secret(&self.telegram.bot_token),
            if self.telegram.chat_id.is_empty() {
                "(not set)"
            } else {
                self.telegram.chat_id.as_str()
            },
            self.telegram.parse_mode,
            self.filters.min_sol,
            self.filters.max_market_cap,
            self.filters.fresh_wallet_max_txs,
            self.dedup.ttl_secs,
            self.dedup.max_entries,
            routers,
        )
    }
}

fn fill_from_env(slot: &mut String, var: &str) {
    if slot.is_empty() {
        if let Ok(value) = std::env::var(var) {
            *slot = value;
        }
    }
}

fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(not set)"
    } else {
        "***"
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            helius: HeliusConfig::default(),
            rugcheck: RugcheckConfig::default(),
            telegram: TelegramConfig::default(),
            filters: FilterConfig::default(),
            dedup: DedupConfig::default(),
            routers: default_routers(),
            logging: LoggingConfig::default(),
        }
    }
}
