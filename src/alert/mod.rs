//! Alert rendering and delivery

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{Error, Result};

pub mod formatter;
pub mod telegram;

pub use formatter::{format_alert, EnrichedAlert};
pub use telegram::TelegramSink;

/// Destination for formatted alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Writes alerts to stdout (replay dry runs)
pub struct StdoutSink;

#[async_trait]
impl AlertSink for StdoutSink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        println!("--- alert for {} ---\n{}\n", chat_id, text);
        Ok(())
    }
}

/// Keeps every alert in memory
#[derive(Default)]
pub struct MemorySink {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (chat_id, text) pairs in delivery order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AlertSink for MemorySink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| Error::Internal("memory sink poisoned".to_string()))?
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}
