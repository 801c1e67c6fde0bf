use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    batch::{entry::TransferEntry, executor::BatchTarget, guard::total_amount},
    error::{AppError, AppResult},
    orders::{Order, TransferOutcome},
};

/// Fold a finished batch into its order record.
///
/// Totals describe what was asked for, so failed transfers still count.
/// Nothing is produced unless every entry has its outcome.
pub fn assemble(
    id: Uuid,
    target: &BatchTarget,
    max_fees: Decimal,
    entries: &[TransferEntry],
    outcomes: Vec<TransferOutcome>,
) -> AppResult<Order> {
    if outcomes.len() != entries.len() {
        return Err(AppError::Internal(format!(
            "batch {} has {} outcomes for {} entries",
            id,
            outcomes.len(),
            entries.len()
        )));
    }

    Ok(Order {
        id,
        chain: target.chain.clone(),
        token: target.token.clone(),
        total_amount: total_amount(entries),
        total_wallets: outcomes.len(),
        outcomes,
        max_fees,
        created_at: Utc::now(),
    })
}
