//! Alert message rendering

use serde::Serialize;

/// Block explorer used for transaction links
pub const EXPLORER_TX_URL: &str = "https://solscan.io/tx/";

/// A transfer that passed every filter, with its display fields resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedAlert {
    pub signature: String,
    pub buyer: String,
    pub mint: String,
    /// Whole SOL received by the buyer in the same transaction
    pub sol_spent: f64,
    pub token_name: String,
    pub token_symbol: String,
    pub market_cap: u64,
    pub wallet_age: String,
    pub funded_by: String,
    pub router: String,
}

/// Render an alert as a Telegram Markdown message
///
/// Free-text fields are escaped; the buyer is base58 and stays inside its
/// code span.
pub fn format_alert(alert: &EnrichedAlert) -> String {
    format!(
        "FRESH WALLET BUY\n\
         \n\
         SOL Spent: {:.3} SOL\n\
         Token: {} ({})\n\
         MCap: ${}\n\
         Age: {}\n\
         Funded: {}\n\
         Router: {}\n\
         \n\
         Buyer: `{}`\n\
         Tx: {}{}",
        alert.sol_spent,
        escape_markdown(&alert.token_name),
        escape_markdown(&alert.token_symbol),
        group_digits(alert.market_cap),
        escape_markdown(&alert.wallet_age),
        escape_markdown(&alert.funded_by),
        escape_markdown(&alert.router),
        truncate_address(&alert.buyer),
        EXPLORER_TX_URL,
        escape_markdown(&alert.signature),
    )
}

/// Escape the characters legacy Telegram Markdown treats as entity markers
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `1234567` → `1,234,567`
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First 8 and last 4 characters of an address
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
