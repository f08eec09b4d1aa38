//! Batch processor: dedup, filter chain, alert dispatch

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::chain::{evaluate_transfer, SkipReason, Thresholds, TransferVerdict};
use crate::alert::{format_alert, AlertSink, EnrichedAlert};
use crate::config::Config;
use crate::dedup::DedupStore;
use crate::enrichment::Enrichers;
use crate::router::RouterTable;
use crate::webhook::types::Transaction;

/// Counters for one processed batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub transactions: usize,
    pub duplicates: usize,
    pub transfers_evaluated: usize,
    pub missing_recipient: usize,
    pub not_fresh: usize,
    pub below_min_spend: usize,
    pub above_max_market_cap: usize,
    pub alerts_sent: usize,
    pub delivery_failures: usize,
}

impl BatchReport {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingRecipient => self.missing_recipient += 1,
            SkipReason::NotFresh => self.not_fresh += 1,
            SkipReason::SpendBelowMinimum { .. } => self.below_min_spend += 1,
            SkipReason::MarketCapTooHigh { .. } => self.above_max_market_cap += 1,
        }
    }

    /// Alerts that passed the chain, delivered or not
    pub fn alerts_produced(&self) -> usize {
        self.alerts_sent + self.delivery_failures
    }
}

/// Everything needed to process webhook batches, built once at startup
pub struct Pipeline {
    dedup: Arc<DedupStore>,
    enrichers: Enrichers,
    sink: Arc<dyn AlertSink>,
    routers: RouterTable,
    thresholds: Thresholds,
    chat_id: String,
    max_concurrent_transfers: usize,
}

impl Pipeline {
    pub fn new(
        dedup: Arc<DedupStore>,
        enrichers: Enrichers,
        sink: Arc<dyn AlertSink>,
        routers: RouterTable,
        thresholds: Thresholds,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            dedup,
            enrichers,
            sink,
            routers,
            thresholds,
            chat_id: chat_id.into(),
            max_concurrent_transfers: 4,
        }
    }

    pub fn from_config(config: &Config, enrichers: Enrichers, sink: Arc<dyn AlertSink>) -> Self {
        Self::new(
            Arc::new(DedupStore::from_config(&config.dedup)),
            enrichers,
            sink,
            RouterTable::from_entries(&config.routers),
            Thresholds::from(&config.filters),
            config.telegram.chat_id.clone(),
        )
        .with_max_concurrent_transfers(config.server.max_concurrent_transfers)
    }

    pub fn with_max_concurrent_transfers(mut self, limit: usize) -> Self {
        self.max_concurrent_transfers = limit.max(1);
        self
    }

    pub fn dedup(&self) -> &Arc<DedupStore> {
        &self.dedup
    }

    /// Process one webhook delivery
    ///
    /// Each transaction is marked seen before its transfers are inspected,
    /// so a repeat delivery is skipped even if this one fails halfway.
    /// Nothing here aborts the batch: lookups degrade to defaults and
    /// delivery errors are logged and counted.
    pub async fn process_batch(&self, batch: &[Transaction]) -> BatchReport {
        let mut report = BatchReport {
            transactions: batch.len(),
            ..BatchReport::default()
        };

        for tx in batch {
            if !self.dedup.check_and_mark(&tx.signature) {
                debug!(signature = %tx.signature, "Duplicate transaction skipped");
                report.duplicates += 1;
                continue;
            }

            // Futures are built up front so no borrowing closure ends up in
            // the stream type; the batch future must stay `Send` for spawning.
            let pending: Vec<BoxFuture<'_, TransferVerdict>> = tx
                .token_transfers
                .iter()
                .map(|transfer| {
                    evaluate_transfer(
                        tx,
                        transfer,
                        &self.enrichers,
                        &self.thresholds,
                        &self.routers,
                    )
                    .boxed()
                })
                .collect();
            let verdicts = stream::iter(pending).buffered(self.max_concurrent_transfers);
            futures::pin_mut!(verdicts);

            while let Some(verdict) = verdicts.next().await {
                report.transfers_evaluated += 1;
                match verdict {
                    TransferVerdict::Alert(alert) => self.dispatch(&alert, &mut report).await,
                    TransferVerdict::Skipped(reason) => report.record_skip(reason),
                }
            }
        }

        info!(
            transactions = report.transactions,
            duplicates = report.duplicates,
            transfers = report.transfers_evaluated,
            produced = report.alerts_produced(),
            alerts = report.alerts_sent,
            failures = report.delivery_failures,
            "Batch processed"
        );

        report
    }

    async fn dispatch(&self, alert: &EnrichedAlert, report: &mut BatchReport) {
        let text = format_alert(alert);
        match self.sink.send(&self.chat_id, &text).await {
            Ok(()) => {
                report.alerts_sent += 1;
                info!(
                    signature = %alert.signature,
                    buyer = %alert.buyer,
                    mint = %alert.mint,
                    sol = alert.sol_spent,
                    market_cap = alert.market_cap,
                    "Fresh wallet alert sent"
                );
            }
            Err(e) => {
                report.delivery_failures += 1;
                warn!(
                    signature = %alert.signature,
                    retryable = e.is_retryable(),
                    "Alert delivery failed: {}",
                    e
                );
            }
        }
    }
}
