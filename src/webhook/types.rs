//! Helius enhanced-transaction webhook payload
//!
//! Only the fields the relay reads are modelled; everything else in the
//! payload is ignored. Collections that Helius sends as `null` or omits
//! entirely deserialize to empty vectors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: f64 = 1e9;

/// One webhook delivery: transactions in arrival order
pub type TransactionBatch = Vec<Transaction>;

/// Parse a delivery one transaction at a time
///
/// An item that fails to parse, or has no signature to deduplicate on, is
/// logged and dropped; its siblings are kept.
pub fn parse_batch(items: Vec<Value>) -> TransactionBatch {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Transaction>(item) {
            Ok(tx) if tx.signature.is_empty() => {
                warn!(index, "Skipping transaction with empty signature");
                None
            }
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!(index, "Skipping malformed transaction: {}", e);
                None
            }
        })
        .collect()
}

/// Enhanced transaction as delivered by the webhook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub signature: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub native_transfers: Vec<NativeTransfer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: Vec<Instruction>,
    /// Funding/originating service label (e.g. "PUMP_FUN", "RAYDIUM")
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Transaction {
    /// Lamports sent to `recipient` by the first matching native transfer
    pub fn lamports_to(&self, recipient: &str) -> u64 {
        self.native_transfers
            .iter()
            .find(|nt| nt.to_user_account.as_deref() == Some(recipient))
            .map(|nt| nt.amount)
            .unwrap_or(0)
    }

    /// SOL sent to `recipient`, 0.0 when no native transfer matches
    pub fn sol_spent_by(&self, recipient: &str) -> f64 {
        self.lamports_to(recipient) as f64 / LAMPORTS_PER_SOL
    }

    /// Program id of the first instruction, if any
    pub fn first_program_id(&self) -> Option<&str> {
        self.instructions.first().map(|ix| ix.program_id.as_str())
    }

    /// Funding source label, "Unknown" when absent or empty
    pub fn source_label(&self) -> &str {
        match self.source.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "Unknown",
        }
    }
}

/// SPL token movement inside a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub to_user_account: Option<String>,
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub token_metadata: Option<TokenMetadata>,
}

impl TokenTransfer {
    /// Recipient wallet, `None` when absent or empty
    pub fn recipient(&self) -> Option<&str> {
        self.to_user_account.as_deref().filter(|a| !a.is_empty())
    }

    /// Display symbol, "???" when metadata is missing
    pub fn display_symbol(&self) -> String {
        self.token_metadata
            .as_ref()
            .and_then(|m| m.symbol.as_deref())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "???".to_string())
    }

    /// Display name, first 8 characters of the mint when metadata is missing
    pub fn display_name(&self) -> String {
        self.token_metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.mint.chars().take(8).collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// SOL movement inside a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    #[serde(default)]
    pub program_id: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
