use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const NO_TX_HASH: &str = "-";
pub const PENDING: &str = "Pending";
pub const FAILED: &str = "Failed";

/// What the ledger last told us about a recipient's transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledStatus {
    pub recipient: String,
    pub status: String,
    /// `-` when there is nothing to link to
    pub tx_hash: String,
    pub chain: String,
}

impl ReconciledStatus {
    pub fn failed(recipient: &str, chain: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            status: FAILED.to_string(),
            tx_hash: NO_TX_HASH.to_string(),
            chain: chain.to_string(),
        }
    }

    pub fn has_tx_hash(&self) -> bool {
        !self.tx_hash.is_empty() && self.tx_hash != NO_TX_HASH
    }
}

/// Display-only status cache keyed by recipient address.
///
/// Disposable: it can be dropped and rebuilt from the order log at any time.
/// Concurrent writers for the same recipient resolve last-write-wins.
pub struct StatusCache {
    entries: RwLock<HashMap<String, ReconciledStatus>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, recipient: &str) -> Option<ReconciledStatus> {
        self.entries.read().await.get(recipient).cloned()
    }

    /// Status to show for a recipient; unknown recipients are still pending
    pub async fn display_status(&self, recipient: &str) -> String {
        self.get(recipient)
            .await
            .map(|s| s.status)
            .unwrap_or_else(|| PENDING.to_string())
    }

    pub async fn upsert(&self, status: ReconciledStatus) {
        debug!("💾 Status for {}: {} ({})", status.recipient, status.status, status.tx_hash);
        self.entries
            .write()
            .await
            .insert(status.recipient.clone(), status);
    }

    pub async fn snapshot(&self) -> HashMap<String, ReconciledStatus> {
        self.entries.read().await.clone()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("🔄 Status cache cleared");
    }

    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}
