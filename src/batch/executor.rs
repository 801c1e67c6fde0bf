use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    batch::entry::TransferEntry,
    error::{AppError, AppResult},
    ledger::{models::TransferRequest, LedgerGateway},
    orders::{OutcomeStatus, TransferOutcome},
};

/// Signals published while a batch runs
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Started {
        batch_id: Uuid,
        chain: String,
        token: String,
        entries: usize,
    },
    Transferred {
        batch_id: Uuid,
        sequence: u32,
        recipient: String,
        status: OutcomeStatus,
    },
    Finished {
        batch_id: Uuid,
        succeeded: usize,
        failed: usize,
    },
}

/// Resolved target of a batch
#[derive(Debug, Clone)]
pub struct BatchTarget {
    pub chain: String,
    pub token: String,
    pub token_address: String,
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub transfer_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            transfer_timeout: Duration::from_secs(30),
        }
    }
}

/// Held for as long as a batch is being submitted; releases on drop
#[derive(Debug)]
pub struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs a batch transfer by transfer against the ledger.
///
/// INVARIANTS:
/// - transfers never overlap: each call finishes before the next starts
/// - every entry gets exactly one outcome, whatever happened to the others
pub struct BatchExecutor {
    gateway: Arc<dyn LedgerGateway>,
    config: ExecutorConfig,
    events: broadcast::Sender<BatchEvent>,
    running: Arc<AtomicBool>,
}

impl BatchExecutor {
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: ExecutorConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            gateway,
            config,
            events,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the executor; a second caller is refused until the first drops its claim
    pub fn try_begin(&self) -> AppResult<InFlight> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(self.running.clone()))
            .map_err(|_| AppError::BatchInFlight)
    }

    fn publish(&self, event: BatchEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }

    #[instrument(skip(self, target, entries), fields(chain = %target.chain, token = %target.token, entries = entries.len()))]
    pub async fn run(
        &self,
        batch_id: Uuid,
        target: &BatchTarget,
        entries: &[TransferEntry],
    ) -> Vec<TransferOutcome> {
        info!("🚀 Starting batch {} ({} transfers)", batch_id, entries.len());
        self.publish(BatchEvent::Started {
            batch_id,
            chain: target.chain.clone(),
            token: target.token.clone(),
            entries: entries.len(),
        });

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = self.execute_one(target, entry).await;
            self.publish(BatchEvent::Transferred {
                batch_id,
                sequence: entry.sequence,
                recipient: entry.recipient.clone(),
                status: outcome.status(),
            });
            outcomes.push(outcome);
        }

        let succeeded = outcomes
            .iter()
            .filter(|o| o.status() == OutcomeStatus::Success)
            .count();
        let failed = outcomes.len() - succeeded;

        info!("✓ Batch {} finished: {} succeeded, {} failed", batch_id, succeeded, failed);
        self.publish(BatchEvent::Finished {
            batch_id,
            succeeded,
            failed,
        });

        outcomes
    }

    async fn execute_one(&self, target: &BatchTarget, entry: &TransferEntry) -> TransferOutcome {
        let request = TransferRequest {
            network_name: target.chain.clone(),
            token_address: target.token_address.clone(),
            recipient_address: entry.recipient.clone(),
            quantity: entry.amount.trim().to_string(),
        };

        let call = tokio::time::timeout(self.config.transfer_timeout, self.gateway.transfer(&request));

        match call.await {
            Ok(Ok(receipt)) => match receipt.order_id {
                Some(order_id) => TransferOutcome::success(&entry.recipient, order_id),
                None => {
                    warn!("Transfer to {} returned no order id", entry.recipient);
                    TransferOutcome::failed(&entry.recipient)
                }
            },
            Ok(Err(e)) => {
                warn!("Transfer to {} failed: {}", entry.recipient, e);
                TransferOutcome::failed(&entry.recipient)
            }
            Err(_) => {
                warn!(
                    "Transfer to {} timed out after {:?}",
                    entry.recipient, self.config.transfer_timeout
                );
                TransferOutcome::failed(&entry.recipient)
            }
        }
    }
}
