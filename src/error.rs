//! Error types for the relay

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid router program id {program_id}: {reason}")]
    InvalidRouter { program_id: String, reason: String },

    // Upstream provider errors
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream API error {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream timeout after {0}ms")]
    UpstreamTimeout(u64),

    #[error("Missing field in upstream response: {0}")]
    MissingField(&'static str),

    // Alert delivery errors
    #[error("Alert delivery failed: {0}")]
    AlertDelivery(String),

    // Webhook bootstrap errors
    #[error("Webhook registration failed: {0}")]
    WebhookRegistration(String),

    // Payload errors
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream(_) | Error::UpstreamTimeout(_) | Error::AlertDelivery(_) => true,
            Error::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
