use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single token transfer handed to the ledger
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransferRequest {
    pub network_name: String,
    pub token_address: String,
    pub recipient_address: String,
    /// Quantity exactly as the user entered it
    pub quantity: String,
}

/// What the ledger answers to an accepted transfer.
///
/// A missing `order_id` means the ledger accepted the call but gave us
/// nothing to track, which the executor treats as a failed transfer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TransferReceipt {
    #[serde(default, rename = "orderId", alias = "order_id")]
    pub order_id: Option<String>,
}

/// One job in the ledger's order history
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StatusRecord {
    #[serde(default)]
    pub order_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default, alias = "network")]
    pub network_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPage {
    #[serde(default)]
    pub jobs: Vec<StatusRecord>,
}

/// Token the ledger can move on a given network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub token_name: String,
    pub token_address: String,
    pub network_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioToken {
    pub token_name: String,
    pub network_name: String,
    pub quantity: String,
}

impl PortfolioToken {
    pub fn matches(&self, chain: &str, token: &str) -> bool {
        self.network_name == chain && self.token_name == token
    }

    /// Unreadable quantities count as an empty balance
    pub fn balance(&self) -> Decimal {
        self.quantity.trim().parse().unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub tokens: Vec<PortfolioToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPage {
    #[serde(default)]
    pub tokens: Vec<TokenInfo>,
}

/// Envelope every ledger endpoint wraps its payload in
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    pub data: T,
}
