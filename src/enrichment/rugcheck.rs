//! Rugcheck token report client (market cap)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{Lookup, MarketCapLookup, MARKET_CAP_SENTINEL};
use crate::config::RugcheckConfig;
use crate::error::{Error, Result};

pub struct RugcheckClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RugcheckClient {
    pub fn new(config: &RugcheckConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Fetch the token report and read its market cap
    pub async fn fetch_market_cap(&self, mint: &str) -> Result<u64> {
        let url = format!("{}/v1/tokens/{}/report", self.base_url, mint);

        debug!(mint = %mint, "Fetching token report");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::UpstreamTimeout(self.timeout.as_millis() as u64)
                } else {
                    Error::Upstream(format!("Rugcheck request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let report: TokenReport = response.json().await.map_err(|e| {
            Error::Deserialization(format!("Failed to parse Rugcheck report: {}", e))
        })?;

        report.market_cap()
    }
}

#[async_trait]
impl MarketCapLookup for RugcheckClient {
    async fn market_cap(&self, mint: &str) -> Lookup<u64> {
        let lookup = Lookup::from_result(self.fetch_market_cap(mint).await, MARKET_CAP_SENTINEL);
        if let Some(reason) = lookup.default_reason() {
            debug!(mint = %mint, "Market cap lookup failed, using sentinel: {}", reason);
        }
        lookup
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenReport {
    #[serde(default)]
    market_cap: Option<Value>,
}

impl TokenReport {
    /// Positive market cap, truncated to whole dollars
    fn market_cap(&self) -> Result<u64> {
        let value = self
            .market_cap
            .as_ref()
            .and_then(Value::as_f64)
            .ok_or(Error::MissingField("marketCap"))?;

        if !value.is_finite() || value < 1.0 {
            return Err(Error::MissingField("marketCap"));
        }

        Ok(value.trunc() as u64)
    }
}
