use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::{
    ledger::LedgerGateway,
    orders::Order,
    reconcile::cache::{ReconciledStatus, StatusCache, NO_TX_HASH},
};

#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub status_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(10),
            max_concurrency: 8,
        }
    }
}

/// One outcome waiting to be resolved against the ledger
struct Lookup {
    recipient: String,
    order_id: Option<String>,
    chain: String,
}

/// Turns recorded outcomes into the ledger's current view of them.
///
/// Results land in the shared [`StatusCache`]; a pass never touches the
/// order log.
pub struct ReconciliationEngine {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<StatusCache>,
    config: ReconcileConfig,
}

impl ReconciliationEngine {
    pub fn new(gateway: Arc<dyn LedgerGateway>, cache: Arc<StatusCache>, config: ReconcileConfig) -> Self {
        Self {
            gateway,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    /// Resolve every outcome of `orders` and merge the results into the cache.
    ///
    /// `orders` is expected in log order; when a recipient shows up more than
    /// once, the outcome that comes last decides.
    ///
    /// Returns what this pass resolved, keyed by recipient.
    #[instrument(skip(self, orders), fields(orders = orders.len()))]
    pub async fn reconcile(&self, orders: &[Order]) -> HashMap<String, ReconciledStatus> {
        let lookups: Vec<Lookup> = orders
            .iter()
            .flat_map(|order| {
                order.outcomes.iter().map(move |outcome| Lookup {
                    recipient: outcome.recipient().to_string(),
                    order_id: outcome.trackable_id().map(str::to_string),
                    chain: order.chain.clone(),
                })
            })
            .collect();

        let total = lookups.len();
        let concurrency = self.config.max_concurrency.max(1);

        // queries overlap, results come back in log order
        let resolved: Vec<ReconciledStatus> = stream::iter(lookups)
            .map(|lookup| self.resolve(lookup))
            .buffered(concurrency)
            .collect()
            .await;

        // later outcomes for the same recipient win
        let mut latest = HashMap::with_capacity(resolved.len());
        for status in resolved {
            self.cache.upsert(status.clone()).await;
            latest.insert(status.recipient.clone(), status);
        }

        info!("🔍 Reconciled {} outcomes across {} orders", total, orders.len());
        latest
    }

    async fn resolve(&self, lookup: Lookup) -> ReconciledStatus {
        let Some(order_id) = lookup.order_id else {
            return ReconciledStatus::failed(&lookup.recipient, &lookup.chain);
        };

        let query = self.gateway.query_status(&order_id, 0, 1);
        let page = match tokio::time::timeout(self.config.status_timeout, query).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                warn!("Status query for {} failed: {}", order_id, e);
                return ReconciledStatus::failed(&lookup.recipient, &lookup.chain);
            }
            Err(_) => {
                warn!("Status query for {} timed out", order_id);
                return ReconciledStatus::failed(&lookup.recipient, &lookup.chain);
            }
        };

        match page.jobs.into_iter().next() {
            Some(record) => ReconciledStatus {
                recipient: lookup.recipient,
                status: record.status,
                tx_hash: record
                    .transaction_hash
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| NO_TX_HASH.to_string()),
                chain: record.network_name.unwrap_or(lookup.chain),
            },
            None => {
                warn!("Ledger has no record of order {}", order_id);
                ReconciledStatus::failed(&lookup.recipient, &lookup.chain)
            }
        }
    }
}
