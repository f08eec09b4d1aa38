//! Helius API client
//!
//! Provides:
//! - Wallet freshness (recent transaction count)
//! - Wallet age (earliest known transaction)
//! - Enhanced-transaction webhook registration

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{format_wallet_age, FreshnessLookup, Lookup, WalletAgeLookup, JUST_BORN, UNKNOWN_AGE};
use crate::config::HeliusConfig;
use crate::error::{Error, Result};

/// Helius API client
pub struct HeliusClient {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Base URL for REST API
    rest_base_url: String,
    /// Request timeout
    timeout: Duration,
    /// Wallets with fewer transactions than this are fresh
    fresh_wallet_max_txs: u32,
}

impl HeliusClient {
    /// Create a new Helius client
    pub fn new(config: &HeliusConfig, fresh_wallet_max_txs: u32) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            rest_base_url: config.rest_base_url.trim_end_matches('/').to_string(),
            timeout,
            fresh_wallet_max_txs,
        })
    }

    /// Fetch enhanced transactions for an address
    async fn get_transactions(
        &self,
        address: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<HeliusTransaction>> {
        if self.api_key.is_empty() {
            return Err(Error::MissingEnvVar("HELIUS_API_KEY".to_string()));
        }

        let url = format!("{}/v0/addresses/{}/transactions", self.rest_base_url, address);

        let response = self
            .client
            .get(&url)
            .query(&[("api-key", self.api_key.as_str())])
            .query(extra)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Helius request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Deserialization(format!("Failed to parse Helius response: {}", e)))
    }

    /// Whether the wallet has fewer than `fresh_wallet_max_txs` transactions
    pub async fn fetch_is_fresh(&self, address: &str) -> Result<bool> {
        let limit = self.fresh_wallet_max_txs.to_string();
        let transactions = self.get_transactions(address, &[("limit", limit.as_str())]).await?;
        debug!(
            wallet = %address,
            count = transactions.len(),
            "Fetched wallet activity"
        );
        Ok(transactions.len() < self.fresh_wallet_max_txs as usize)
    }

    /// Unix timestamp of the wallet's earliest transaction, `None` if it has none
    pub async fn fetch_first_seen(&self, address: &str) -> Result<Option<i64>> {
        let transactions = self
            .get_transactions(address, &[("limit", "1"), ("before", "earliest")])
            .await?;

        match transactions.first() {
            None => Ok(None),
            Some(tx) => tx
                .unix_time()
                .map(Some)
                .ok_or(Error::MissingField("timestamp")),
        }
    }

    /// Register the enhanced-transaction webhook pointing at this relay
    pub async fn register_webhook(
        &self,
        webhook_url: &str,
        account_addresses: &[String],
    ) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::MissingEnvVar("HELIUS_API_KEY".to_string()));
        }
        if webhook_url.is_empty() {
            return Err(Error::Config("helius.webhook_url is not set".to_string()));
        }

        let request = serde_json::json!({
            "webhookURL": webhook_url,
            "transactionTypes": ["ANY"],
            "webhookType": "enhanced",
            "accountAddresses": account_addresses,
        });

        let response = self
            .client
            .post(format!("{}/v0/webhooks", self.rest_base_url))
            .query(&[("api-key", self.api_key.as_str())])
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::WebhookRegistration(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::WebhookRegistration(format!(
                "Helius API error {}: {}",
                status, body
            )));
        }

        info!(webhook_url = %webhook_url, "Helius webhook registered");
        Ok(())
    }
}

/// Wallet age label at `now` for a wallet first seen at `first_seen`
pub fn wallet_age_label(first_seen: Option<i64>, now: i64) -> String {
    match first_seen {
        None => JUST_BORN.to_string(),
        Some(ts) => format_wallet_age((now - ts) as f64 / 60.0),
    }
}

#[async_trait]
impl FreshnessLookup for HeliusClient {
    async fn is_fresh_wallet(&self, address: &str) -> Lookup<bool> {
        let lookup = Lookup::from_result(self.fetch_is_fresh(address).await, false);
        if let Some(reason) = lookup.default_reason() {
            debug!(wallet = %address, "Freshness lookup failed, treating as not fresh: {}", reason);
        }
        lookup
    }
}

#[async_trait]
impl WalletAgeLookup for HeliusClient {
    async fn wallet_age(&self, address: &str) -> Lookup<String> {
        let now = chrono::Utc::now().timestamp();
        let result = self
            .fetch_first_seen(address)
            .await
            .map(|first_seen| wallet_age_label(first_seen, now));
        let lookup = Lookup::from_result(result, UNKNOWN_AGE.to_string());
        if let Some(reason) = lookup.default_reason() {
            debug!(wallet = %address, "Wallet age lookup failed: {}", reason);
        }
        lookup
    }
}

// ============ Helius API Response Types ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeliusTransaction {
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    block_time: Option<i64>,
}

impl HeliusTransaction {
    fn unix_time(&self) -> Option<i64> {
        self.timestamp.or(self.block_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config(api_key: &str) -> HeliusConfig {
        HeliusConfig {
            api_key: api_key.to_string(),
            // Discard port on loopback: connection is refused immediately
            rest_base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
            ..HeliusConfig::default()
        }
    }

    #[test]
    fn test_wallet_age_label() {
        let now = 1_700_000_000;
        assert_eq!(wallet_age_label(None, now), JUST_BORN);
        assert_eq!(wallet_age_label(Some(now - 30 * 60), now), "30m");
        assert_eq!(wallet_age_label(Some(now - 5 * 3600 - 59), now), "5h");
        assert_eq!(wallet_age_label(Some(now - 3 * 86_400), now), "3d");
    }

    #[test]
    fn test_parse_transaction_time() {
        let txs: Vec<HeliusTransaction> = serde_json::from_str(
            r#"[{"timestamp": 100, "signature": "a"}, {"blockTime": 200}, {"type": "SWAP"}]"#,
        )
        .unwrap();
        assert_eq!(txs[0].unix_time(), Some(100));
        assert_eq!(txs[1].unix_time(), Some(200));
        assert_eq!(txs[2].unix_time(), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_defaults() {
        let client = HeliusClient::new(&unreachable_config(""), 10).unwrap();

        let fresh = client.is_fresh_wallet("Wallet111").await;
        assert!(fresh.is_defaulted());
        assert!(!fresh.into_value());

        let age = client.wallet_age("Wallet111").await;
        assert_eq!(age.value(), UNKNOWN_AGE);
    }

    #[tokio::test]
    async fn test_unreachable_provider_defaults() {
        let client = HeliusClient::new(&unreachable_config("key"), 10).unwrap();

        let fresh = client.is_fresh_wallet("Wallet111").await;
        assert_eq!(*fresh.value(), false);
        assert!(fresh.is_defaulted());

        let age = client.wallet_age("Wallet111").await;
        assert!(age.is_defaulted());
        assert_eq!(age.into_value(), UNKNOWN_AGE);
    }

    #[tokio::test]
    async fn test_register_webhook_requires_url() {
        let client = HeliusClient::new(&unreachable_config("key"), 10).unwrap();
        let err = client.register_webhook("", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
