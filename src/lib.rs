//! Fresh Wallet Relay Library
//!
//! Receives Helius enhanced-transaction webhooks and relays fresh-wallet
//! token buys that meet the spend and market-cap thresholds to Telegram.

pub mod alert;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod pipeline;
pub mod router;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{BatchReport, Pipeline};
