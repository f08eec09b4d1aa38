//! HTTP listener for Helius webhook deliveries

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::types::parse_batch;
use crate::config::ServerConfig;
use crate::pipeline::Pipeline;

/// Helius batches can be large
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

const DEDUP_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    process_inline: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, process_inline: bool) -> Self {
        Self {
            pipeline,
            process_inline,
        }
    }
}

pub fn router(webhook_path: &str, state: AppState) -> Router {
    Router::new()
        .route(webhook_path, post(receive_webhook))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn run_server(config: &ServerConfig, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    let state = AppState::new(pipeline.clone(), config.process_inline);
    let app = router(&config.webhook_path, state);

    spawn_dedup_purge(pipeline);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        "Webhook listener on {}{} (process_inline={})",
        config.bind_addr, config.webhook_path, config.process_inline
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Webhook listener stopped");
    Ok(())
}

/// Acknowledge a batch
///
/// By default the batch is handed to a background task and the sender gets
/// 200 at once, so slow providers cannot push Helius into delivery
/// timeouts. With `process_inline` the batch is processed first.
async fn receive_webhook(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> StatusCode {
    let received = items.len();
    let batch = parse_batch(items);
    debug!(received, parsed = batch.len(), "Webhook batch received");

    if state.process_inline {
        state.pipeline.process_batch(&batch).await;
    } else {
        let pipeline = state.pipeline.clone();
        tokio::spawn(async move {
            pipeline.process_batch(&batch).await;
        });
    }

    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

fn spawn_dedup_purge(pipeline: Arc<Pipeline>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(DEDUP_PURGE_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            purge_dedup(&pipeline);
        }
    });
}

/// Drop expired signatures and report store counters
fn purge_dedup(pipeline: &Pipeline) -> usize {
    let dedup = pipeline.dedup();
    let removed = dedup.purge_expired();
    let stats = dedup.stats();
    info!(
        removed,
        remaining = dedup.len(),
        ttl_secs = dedup.ttl().as_secs(),
        recorded = stats.recorded.load(Ordering::Relaxed),
        duplicates = stats.duplicates.load(Ordering::Relaxed),
        evicted = stats.evicted.load(Ordering::Relaxed),
        "Dedup store purged"
    );
    removed
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::MemorySink;
    use crate::config::Config;
    use crate::pipeline::testing::{tx, FakeEnricher};
    use crate::webhook::types::Transaction;
    use serde_json::json;

    fn items(txs: Vec<Transaction>) -> Json<Vec<Value>> {
        Json(txs.iter().map(|t| serde_json::to_value(t).unwrap()).collect())
    }

    fn state(process_inline: bool, sink: Arc<MemorySink>) -> AppState {
        let fake = FakeEnricher::new().fresh("W1").market_cap("M1", 500_000);
        let pipeline = Pipeline::from_config(&Config::default(), fake.enrichers(), sink);
        AppState::new(Arc::new(pipeline), process_inline)
    }

    #[tokio::test]
    async fn test_inline_processing_before_ack() {
        let sink = Arc::new(MemorySink::new());
        let state = state(true, sink.clone());

        let status = receive_webhook(
            State(state),
            items(vec![tx("sig1", "W1", "M1", 350_000_000)]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_background_processing_acks_immediately() {
        let sink = Arc::new(MemorySink::new());
        let state = state(false, sink.clone());
        let pipeline = state.pipeline.clone();

        let status = receive_webhook(
            State(state),
            items(vec![tx("sig1", "W1", "M1", 350_000_000)]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Wait for the spawned task to finish
        for _ in 0..50 {
            if !sink.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.sent().len(), 1);
        assert!(pipeline.dedup().seen("sig1"));
    }

    #[tokio::test]
    async fn test_malformed_sibling_does_not_drop_batch() {
        let sink = Arc::new(MemorySink::new());
        let state = state(true, sink.clone());

        let good = serde_json::to_value(tx("sig1", "W1", "M1", 350_000_000)).unwrap();
        let body = vec![
            json!({"type": "UNKNOWN", "tokenTransfers": []}),
            good,
            json!({"signature": 42}),
        ];

        let status = receive_webhook(State(state), Json(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sink.sent().len(), 1);
        assert!(sink.sent()[0].1.contains("https://solscan.io/tx/sig1"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_acknowledged() {
        let sink = Arc::new(MemorySink::new());
        let status = receive_webhook(State(state(true, sink.clone())), Json(Vec::new())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_purge_keeps_live_signatures() {
        let sink = Arc::new(MemorySink::new());
        let state = state(true, sink.clone());
        let pipeline = state.pipeline.clone();

        receive_webhook(State(state), items(vec![tx("sig1", "W1", "M1", 350_000_000)])).await;
        receive_webhook(
            State(AppState::new(pipeline.clone(), true)),
            items(vec![tx("sig1", "W1", "M1", 350_000_000)]),
        )
        .await;

        assert_eq!(purge_dedup(&pipeline), 0);
        assert!(pipeline.dedup().seen("sig1"));
        let stats = pipeline.dedup().stats();
        assert_eq!(stats.recorded.load(Ordering::Relaxed), 1);
        assert_eq!(stats.duplicates.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "ok");
    }
}
