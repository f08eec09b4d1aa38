//! Read-only enrichment lookups against upstream providers
//!
//! Each lookup wraps one external call. A failure never propagates: the
//! provider answers with a documented safe default, and the answer says
//! so through [`Lookup::Defaulted`]. The filter chain only sees the
//! capability traits, so tests and alternative providers plug in freely.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub mod helius;
pub mod rugcheck;

pub use helius::HeliusClient;
pub use rugcheck::RugcheckClient;

/// Market cap substituted when the lookup fails. Larger than any sane
/// `max_market_cap`, so the transfer is filtered out.
pub const MARKET_CAP_SENTINEL: u64 = 999_999_999;

/// Wallet age shown when the age lookup fails
pub const UNKNOWN_AGE: &str = "?";

/// Wallet age shown when the wallet has no prior transactions
pub const JUST_BORN: &str = "Just born";

/// Outcome of an enrichment lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Provider answered
    Fetched(T),
    /// Provider failed; `value` is the safe default
    Defaulted { value: T, reason: String },
}

impl<T> Lookup<T> {
    pub fn defaulted(value: T, reason: impl fmt::Display) -> Self {
        Lookup::Defaulted {
            value,
            reason: reason.to_string(),
        }
    }

    /// Wrap a provider result, substituting `default` on error
    pub fn from_result<E: fmt::Display>(result: std::result::Result<T, E>, default: T) -> Self {
        match result {
            Ok(value) => Lookup::Fetched(value),
            Err(e) => Lookup::defaulted(default, e),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Lookup::Fetched(value) | Lookup::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Lookup::Fetched(value) | Lookup::Defaulted { value, .. } => value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Lookup::Defaulted { .. })
    }

    pub fn default_reason(&self) -> Option<&str> {
        match self {
            Lookup::Fetched(_) => None,
            Lookup::Defaulted { reason, .. } => Some(reason),
        }
    }
}

/// Wallet freshness: does the wallet have fewer than N prior transactions?
#[async_trait]
pub trait FreshnessLookup: Send + Sync {
    /// Default on failure: `false`
    async fn is_fresh_wallet(&self, address: &str) -> Lookup<bool>;
}

/// Token market capitalization in USD
#[async_trait]
pub trait MarketCapLookup: Send + Sync {
    /// Default on failure: [`MARKET_CAP_SENTINEL`]
    async fn market_cap(&self, mint: &str) -> Lookup<u64>;
}

/// Human-readable age of a wallet
#[async_trait]
pub trait WalletAgeLookup: Send + Sync {
    /// Default on failure: [`UNKNOWN_AGE`]
    async fn wallet_age(&self, address: &str) -> Lookup<String>;
}

/// The three lookups the filter chain consults
#[derive(Clone)]
pub struct Enrichers {
    pub freshness: Arc<dyn FreshnessLookup>,
    pub market_cap: Arc<dyn MarketCapLookup>,
    pub wallet_age: Arc<dyn WalletAgeLookup>,
}

impl Enrichers {
    pub fn new(
        freshness: Arc<dyn FreshnessLookup>,
        market_cap: Arc<dyn MarketCapLookup>,
        wallet_age: Arc<dyn WalletAgeLookup>,
    ) -> Self {
        Self {
            freshness,
            market_cap,
            wallet_age,
        }
    }

    /// Helius for wallet lookups, Rugcheck for market cap
    pub fn live(helius: HeliusClient, rugcheck: RugcheckClient) -> Self {
        let helius = Arc::new(helius);
        Self {
            freshness: helius.clone(),
            market_cap: Arc::new(rugcheck),
            wallet_age: helius,
        }
    }
}

/// Format wallet age from elapsed minutes: `42m`, `5h` or `3d`
pub fn format_wallet_age(elapsed_minutes: f64) -> String {
    let minutes = elapsed_minutes.max(0.0);
    if minutes < 60.0 {
        format!("{}m", minutes.floor() as u64)
    } else if minutes < 1440.0 {
        format!("{}h", (minutes / 60.0).floor() as u64)
    } else {
        format!("{}d", (minutes / 1440.0).floor() as u64)
    }
}
