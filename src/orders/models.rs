use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Placeholder order id for transfers the ledger never accepted
pub const NO_ORDER_ID: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeStatus::Pending => "Pending",
            OutcomeStatus::Success => "Success",
            OutcomeStatus::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}

/// Result of attempting one transfer.
///
/// INVARIANT: `order_id == "N/A"` exactly when `status == Failed`. Fields are
/// private so outcomes can only come from the constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    recipient: String,
    order_id: String,
    status: OutcomeStatus,
}

impl TransferOutcome {
    pub fn success(recipient: impl Into<String>, order_id: impl Into<String>) -> Self {
        let order_id = order_id.into();
        // an id equal to the sentinel would break the invariant
        if order_id.is_empty() || order_id == NO_ORDER_ID {
            return Self::failed(recipient);
        }

        Self {
            recipient: recipient.into(),
            order_id,
            status: OutcomeStatus::Success,
        }
    }

    pub fn failed(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            order_id: NO_ORDER_ID.to_string(),
            status: OutcomeStatus::Failed,
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    /// Ledger order id worth querying, if any
    pub fn trackable_id(&self) -> Option<&str> {
        (self.status == OutcomeStatus::Success).then_some(self.order_id.as_str())
    }
}

/// Immutable record of one executed batch
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub chain: String,
    pub token: String,
    /// Intended volume, from the submitted batch rather than the outcomes
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    pub total_wallets: usize,
    pub outcomes: Vec<TransferOutcome>,
    #[serde(with = "rust_decimal::serde::str")]
    pub max_fees: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status() == OutcomeStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total_wallets - self.succeeded()
    }
}

/// Sort orders for display, newest first
pub fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}
