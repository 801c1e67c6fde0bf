use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{error::AppResult, orders::models::Order};

/// Append-only store of executed orders.
///
/// Only the order assembler writes; everyone else reads. Subscribers are
/// told the id of every appended order.
#[async_trait]
pub trait OrderLog: Send + Sync {
    async fn append(&self, order: Order) -> AppResult<()>;

    async fn list(&self) -> AppResult<Vec<Order>>;

    fn subscribe(&self) -> broadcast::Receiver<Uuid>;

    /// Drop everything, e.g. when the session ends
    async fn clear(&self) -> AppResult<()>;

    /// Drop entries past their retention window. Returns how many went away.
    async fn purge_expired(&self) -> AppResult<usize> {
        Ok(0)
    }
}

struct LogState {
    orders: Vec<Order>,
    expires_at: Option<Instant>,
}

/// In-memory order log whose contents expire a fixed window after the last
/// write, the way a time-limited session store behaves.
pub struct ExpiringOrderLog {
    state: RwLock<LogState>,
    ttl: Duration,
    appended: broadcast::Sender<Uuid>,
}

impl ExpiringOrderLog {
    pub fn new(ttl: Duration) -> Self {
        let (appended, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(LogState {
                orders: Vec::new(),
                expires_at: None,
            }),
            ttl,
            appended,
        }
    }

    fn is_expired(state: &LogState, now: Instant) -> bool {
        state.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        if Self::is_expired(&state, Instant::now()) {
            0
        } else {
            state.orders.len()
        }
    }
}

#[async_trait]
impl OrderLog for ExpiringOrderLog {
    async fn append(&self, order: Order) -> AppResult<()> {
        let id = order.id;
        {
            let mut state = self.state.write().await;
            let now = Instant::now();
            if Self::is_expired(&state, now) {
                state.orders.clear();
            }
            state.orders.push(order);
            state.expires_at = Some(now + self.ttl);
        }

        debug!("Order {} appended to log", id);
        // no subscribers is fine
        let _ = self.appended.send(id);
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<Order>> {
        let state = self.state.read().await;
        if Self::is_expired(&state, Instant::now()) {
            return Ok(Vec::new());
        }
        Ok(state.orders.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<Uuid> {
        self.appended.subscribe()
    }

    async fn clear(&self) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.expires_at = None;
        info!("🗑️  Order log cleared");
        Ok(())
    }

    async fn purge_expired(&self) -> AppResult<usize> {
        let mut state = self.state.write().await;
        if !Self::is_expired(&state, Instant::now()) {
            return Ok(0);
        }

        let purged = state.orders.len();
        state.orders.clear();
        state.expires_at = None;
        Ok(purged)
    }
}
