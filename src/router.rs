//! Program id → trading venue mapping
//!
//! Entries are validated when the table is built: a program id must be
//! base58 and decode to a 32-byte public key. Invalid entries (such as
//! truncated placeholders) are dropped with a warning instead of being
//! matched against live traffic.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::RouterEntry;
use crate::error::{Error, Result};

/// Label used when the first instruction's program is not mapped
pub const UNKNOWN_ROUTER: &str = "Unknown";

const PUBKEY_LEN: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct RouterTable {
    routers: HashMap<String, String>,
}

impl RouterTable {
    /// Build a table, skipping invalid entries
    pub fn from_entries(entries: &[RouterEntry]) -> Self {
        let mut routers = HashMap::with_capacity(entries.len());

        for entry in entries {
            match validate_entry(entry) {
                Ok(()) => {
                    routers.insert(entry.program_id.clone(), entry.name.clone());
                }
                Err(e) => warn!(router = %entry.name, "Ignoring router entry: {}", e),
            }
        }

        info!("Router table loaded with {} entries", routers.len());
        Self { routers }
    }

    /// Router name for a program id, "Unknown" when absent or unmapped
    pub fn resolve(&self, program_id: Option<&str>) -> &str {
        program_id
            .and_then(|id| self.routers.get(id))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ROUTER)
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }
}

fn validate_entry(entry: &RouterEntry) -> Result<()> {
    let invalid = |reason: String| Error::InvalidRouter {
        program_id: entry.program_id.clone(),
        reason,
    };

    if entry.name.trim().is_empty() {
        return Err(invalid("empty router name".to_string()));
    }

    let bytes = bs58::decode(&entry.program_id)
        .into_vec()
        .map_err(|e| invalid(format!("not base58: {}", e)))?;

    if bytes.len() != PUBKEY_LEN {
        return Err(invalid(format!(
            "decodes to {} bytes, expected {}",
            bytes.len(),
            PUBKEY_LEN
        )));
    }

    Ok(())
}
