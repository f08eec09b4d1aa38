//! In-memory fakes for pipeline tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::alert::AlertSink;
use crate::enrichment::{
    Enrichers, FreshnessLookup, Lookup, MarketCapLookup, WalletAgeLookup, JUST_BORN,
    MARKET_CAP_SENTINEL, UNKNOWN_AGE,
};
use crate::error::{Error, Result};
use crate::webhook::types::{NativeTransfer, TokenMetadata, TokenTransfer, Transaction};

#[derive(Default)]
struct Counters {
    freshness: AtomicUsize,
    market_cap: AtomicUsize,
    wallet_age: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub freshness: usize,
    pub market_cap: usize,
    pub wallet_age: usize,
}

/// Scriptable stand-in for all three providers
#[derive(Clone, Default)]
pub struct FakeEnricher {
    fresh: HashSet<String>,
    market_caps: HashMap<String, u64>,
    fail_freshness: bool,
    fail_age: bool,
    counters: Arc<Counters>,
}

impl FakeEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(mut self, wallet: &str) -> Self {
        self.fresh.insert(wallet.to_string());
        self
    }

    /// Mints without a market cap fail the lookup
    pub fn market_cap(mut self, mint: &str, market_cap: u64) -> Self {
        self.market_caps.insert(mint.to_string(), market_cap);
        self
    }

    pub fn failing_freshness(mut self) -> Self {
        self.fail_freshness = true;
        self
    }

    pub fn failing_age(mut self) -> Self {
        self.fail_age = true;
        self
    }

    pub fn enrichers(&self) -> Enrichers {
        let shared = Arc::new(self.clone());
        Enrichers::new(shared.clone(), shared.clone(), shared)
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            freshness: self.counters.freshness.load(Ordering::SeqCst),
            market_cap: self.counters.market_cap.load(Ordering::SeqCst),
            wallet_age: self.counters.wallet_age.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl FreshnessLookup for FakeEnricher {
    async fn is_fresh_wallet(&self, address: &str) -> Lookup<bool> {
        self.counters.freshness.fetch_add(1, Ordering::SeqCst);
        if self.fail_freshness {
            return Lookup::defaulted(false, "connection refused");
        }
        Lookup::Fetched(self.fresh.contains(address))
    }
}

#[async_trait]
impl MarketCapLookup for FakeEnricher {
    async fn market_cap(&self, mint: &str) -> Lookup<u64> {
        self.counters.market_cap.fetch_add(1, Ordering::SeqCst);
        match self.market_caps.get(mint) {
            Some(mc) => Lookup::Fetched(*mc),
            None => Lookup::defaulted(MARKET_CAP_SENTINEL, "timed out after 3000ms"),
        }
    }
}

#[async_trait]
impl WalletAgeLookup for FakeEnricher {
    async fn wallet_age(&self, _address: &str) -> Lookup<String> {
        self.counters.wallet_age.fetch_add(1, Ordering::SeqCst);
        if self.fail_age {
            return Lookup::defaulted(UNKNOWN_AGE.to_string(), "bad gateway");
        }
        Lookup::Fetched(JUST_BORN.to_string())
    }
}

/// Sink that rejects messages containing `poison`, recording the rest
#[derive(Default)]
pub struct FlakySink {
    poison: String,
    delivered: Mutex<Vec<String>>,
    attempts: AtomicUsize,
}

impl FlakySink {
    pub fn rejecting(poison: &str) -> Self {
        Self {
            poison: poison.to_string(),
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSink for FlakySink {
    async fn send(&self, _chat_id: &str, text: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.poison.is_empty() && text.contains(&self.poison) {
            return Err(Error::AlertDelivery("chat not found".to_string()));
        }
        self.delivered.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Token transfer to `buyer` with FOO/Foomoon metadata
pub fn transfer(buyer: &str, mint: &str) -> TokenTransfer {
    TokenTransfer {
        to_user_account: Some(buyer.to_string()),
        mint: mint.to_string(),
        token_metadata: Some(TokenMetadata {
            symbol: Some("FOO".to_string()),
            name: Some("Foomoon".to_string()),
        }),
    }
}

/// Transaction with one token transfer and one native transfer to `buyer`
pub fn tx(signature: &str, buyer: &str, mint: &str, lamports: u64) -> Transaction {
    Transaction {
        signature: signature.to_string(),
        token_transfers: vec![transfer(buyer, mint)],
        native_transfers: vec![NativeTransfer {
            from_user_account: Some("Funder111".to_string()),
            to_user_account: Some(buyer.to_string()),
            amount: lamports,
        }],
        ..Transaction::default()
    }
}
