//! Webhook event processing pipeline
//!
//! A [`Pipeline`] owns the dedup store, the enrichment capabilities, the
//! router table and the alert sink. It is built once at startup and shared
//! by every webhook delivery.

pub mod chain;
pub mod processor;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{evaluate_transfer, SkipReason, Thresholds, TransferVerdict};
pub use processor::{BatchReport, Pipeline};
