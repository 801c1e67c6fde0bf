use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    batch::{normalizer::SkippedLine, EntryField, TransferEntry},
    orders::{Order, OutcomeStatus, TransferOutcome},
    reconcile::{cache::PENDING, ExplorerRegistry, ReconciledStatus},
};

// ========== REQUEST MODELS ==========

/// Pick the chain and token the draft pays out in
#[derive(Debug, Deserialize, Validate)]
pub struct SelectionRequest {
    #[validate(length(min = 1, max = 64, message = "chain is required"))]
    pub chain: String,
    #[validate(length(min = 1, max = 64, message = "token is required"))]
    pub token: String,
}

/// Edit one cell of the draft
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRowRequest {
    pub field: EntryField,
    #[validate(length(max = 256, message = "value is too long"))]
    pub value: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubmitRequest {
    /// Balance the user confirmed against
    #[validate(custom = "non_negative")]
    pub expected_balance: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub max_fees: Option<Decimal>,
}

fn non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() {
        let mut error = validator::ValidationError::new("non_negative");
        error.message = Some("must not be negative".into());
        return Err(error);
    }
    Ok(())
}

// ========== RESPONSE MODELS ==========

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub entries: Vec<TransferEntry>,
    pub skipped: Vec<SkippedLine>,
}

/// One transfer as shown in the history
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TransferView {
    pub recipient: String,
    pub order_id: String,
    pub outcome: OutcomeStatus,
    /// Latest ledger status, `Pending` until reconciled
    pub status: String,
    pub tx_hash: String,
    pub network: String,
    pub explorer_url: Option<String>,
}

impl TransferView {
    fn build(
        outcome: &TransferOutcome,
        chain: &str,
        statuses: &HashMap<String, ReconciledStatus>,
        explorer: &ExplorerRegistry,
    ) -> Self {
        match statuses.get(outcome.recipient()) {
            Some(status) => Self {
                recipient: outcome.recipient().to_string(),
                order_id: outcome.order_id().to_string(),
                outcome: outcome.status(),
                status: status.status.clone(),
                tx_hash: status.tx_hash.clone(),
                network: status.chain.clone(),
                explorer_url: status
                    .has_tx_hash()
                    .then(|| explorer.explorer_link(&status.chain, &status.tx_hash))
                    .flatten(),
            },
            None => Self {
                recipient: outcome.recipient().to_string(),
                order_id: outcome.order_id().to_string(),
                outcome: outcome.status(),
                status: PENDING.to_string(),
                tx_hash: "-".to_string(),
                network: chain.to_string(),
                explorer_url: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub chain: String,
    pub token: String,
    pub total_amount: String,
    pub total_wallets: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub max_fees: String,
    pub created_at: DateTime<Utc>,
    pub transfers: Vec<TransferView>,
}

impl OrderView {
    pub fn build(
        order: &Order,
        statuses: &HashMap<String, ReconciledStatus>,
        explorer: &ExplorerRegistry,
    ) -> Self {
        Self {
            id: order.id,
            chain: order.chain.clone(),
            token: order.token.clone(),
            total_amount: order.total_amount.to_string(),
            total_wallets: order.total_wallets,
            succeeded: order.succeeded(),
            failed: order.failed(),
            max_fees: order.max_fees.to_string(),
            created_at: order.created_at,
            transfers: order
                .outcomes
                .iter()
                .map(|o| TransferView::build(o, &order.chain, statuses, explorer))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub orders: usize,
    pub statuses: Vec<ReconciledStatus>,
}

#[derive(Debug, Serialize)]
pub struct ExplorerLinkResponse {
    pub network: String,
    pub tx_hash: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub chain: String,
    pub token: String,
    pub balance: String,
}

#[derive(Debug, Serialize)]
pub struct SessionClearedResponse {
    pub cleared: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub ledger: String,
    pub batch_in_flight: bool,
    pub orders: usize,
}
