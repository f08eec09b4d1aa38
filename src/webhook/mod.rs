//! Webhook ingestion: payload types and the HTTP listener

pub mod server;
pub mod types;

pub use server::{router, run_server, AppState};
pub use types::{parse_batch, NativeTransfer, TokenTransfer, Transaction, TransactionBatch};
