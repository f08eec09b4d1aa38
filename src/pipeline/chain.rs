//! Per-transfer filter chain
//!
//! Steps run cheapest first and stop at the first failure:
//! recipient present → wallet fresh → SOL spend ≥ minimum →
//! market cap ≤ maximum → resolve display fields (wallet age last).
//! The two paid lookups (market cap, age) are only reached by transfers
//! that already passed the free checks.

use std::fmt;
use tracing::debug;

use crate::alert::EnrichedAlert;
use crate::config::FilterConfig;
use crate::enrichment::Enrichers;
use crate::router::RouterTable;
use crate::webhook::types::{TokenTransfer, Transaction};

/// Thresholds applied by the chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_sol: f64,
    pub max_market_cap: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for Thresholds {
    fn from(config: &FilterConfig) -> Self {
        Self {
            min_sol: config.min_sol,
            max_market_cap: config.max_market_cap,
        }
    }
}

/// Why a transfer did not produce an alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    MissingRecipient,
    NotFresh,
    SpendBelowMinimum { sol_spent: f64 },
    MarketCapTooHigh { market_cap: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingRecipient => write!(f, "missing recipient"),
            SkipReason::NotFresh => write!(f, "wallet not fresh"),
            SkipReason::SpendBelowMinimum { sol_spent } => {
                write!(f, "spend {:.3} SOL below minimum", sol_spent)
            }
            SkipReason::MarketCapTooHigh { market_cap } => {
                write!(f, "market cap {} above maximum", market_cap)
            }
        }
    }
}

/// Result of running one transfer through the chain
#[derive(Debug, Clone, PartialEq)]
pub enum TransferVerdict {
    Alert(EnrichedAlert),
    Skipped(SkipReason),
}

impl TransferVerdict {
    pub fn is_alert(&self) -> bool {
        matches!(self, TransferVerdict::Alert(_))
    }
}

/// Decide whether one token transfer becomes an alert
pub async fn evaluate_transfer(
    tx: &Transaction,
    transfer: &TokenTransfer,
    enrichers: &Enrichers,
    thresholds: &Thresholds,
    routers: &RouterTable,
) -> TransferVerdict {
    let skip = |reason: SkipReason| {
        debug!(signature = %tx.signature, mint = %transfer.mint, "Transfer skipped: {}", reason);
        TransferVerdict::Skipped(reason)
    };

    let buyer = match transfer.recipient() {
        Some(buyer) => buyer,
        None => return skip(SkipReason::MissingRecipient),
    };

    if !enrichers.freshness.is_fresh_wallet(buyer).await.into_value() {
        return skip(SkipReason::NotFresh);
    }

    let sol_spent = tx.sol_spent_by(buyer);
    if sol_spent < thresholds.min_sol {
        return skip(SkipReason::SpendBelowMinimum { sol_spent });
    }

    let market_cap = enrichers.market_cap.market_cap(&transfer.mint).await.into_value();
    if market_cap > thresholds.max_market_cap {
        return skip(SkipReason::MarketCapTooHigh { market_cap });
    }

    let wallet_age = enrichers.wallet_age.wallet_age(buyer).await.into_value();

    TransferVerdict::Alert(EnrichedAlert {
        signature: tx.signature.clone(),
        buyer: buyer.to_string(),
        mint: transfer.mint.clone(),
        sol_spent,
        token_name: transfer.display_name(),
        token_symbol: transfer.display_symbol(),
        market_cap,
        wallet_age,
        funded_by: tx.source_label().to_string(),
        router: routers.resolve(tx.first_program_id()).to_string(),
    })
}
