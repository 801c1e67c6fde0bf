use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use crate::{
    api::handler::AppState,
    batch::{BatchExecutor, DisbursementService, ExecutorConfig},
    config::Config,
    error::AppResult,
    ledger::{HttpLedgerClient, HttpLedgerConfig, LedgerGateway},
    orders::{ExpiringOrderLog, OrderLog},
    reconcile::{ExplorerRegistry, ReconcileConfig, ReconciliationEngine, StatusCache},
};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let gateway = Arc::new(HttpLedgerClient::new(HttpLedgerConfig {
        base_url: config.ledger_base_url.clone(),
        api_key: config.ledger_api_key.clone(),
        auth_token: config.ledger_auth_token.clone(),
        request_timeout: config.transfer_timeout(),
    })?);
    info!("✅ Ledger client initialized for {}", config.ledger_base_url);

    let state = build_state(gateway, config);

    spawn_reconciler(&state);
    spawn_order_purge(&state);

    Ok(state)
}

/// Wire every component around an already constructed gateway
pub fn build_state(gateway: Arc<dyn LedgerGateway>, config: &Config) -> AppState {
    let order_log: Arc<dyn OrderLog> = Arc::new(ExpiringOrderLog::new(config.order_log_ttl()));
    info!("✅ Order log initialized ({}s window)", config.order_log_ttl_secs);

    let executor = Arc::new(BatchExecutor::new(
        gateway.clone(),
        ExecutorConfig {
            transfer_timeout: config.transfer_timeout(),
        },
    ));

    let service = DisbursementService::new(
        gateway.clone(),
        executor,
        order_log.clone(),
        config.status_timeout(),
    );

    let reconciler = Arc::new(ReconciliationEngine::new(
        gateway.clone(),
        Arc::new(StatusCache::new()),
        ReconcileConfig {
            status_timeout: config.status_timeout(),
            max_concurrency: config.reconcile_concurrency,
        },
    ));
    info!(
        "✅ Reconciliation engine initialized (concurrency {})",
        config.reconcile_concurrency
    );

    let mut explorer = ExplorerRegistry::default();
    let overrides = explorer.extend_from(&config.explorer_templates);
    if overrides > 0 {
        info!("🔗 {} explorer templates loaded from configuration", overrides);
    }

    AppState {
        service,
        reconciler,
        order_log,
        explorer: Arc::new(explorer),
        gateway,
    }
}

/// Re-run reconciliation whenever an order lands in the log
fn spawn_reconciler(state: &AppState) {
    let order_log = state.order_log.clone();
    let reconciler = state.reconciler.clone();
    let mut appended = order_log.subscribe();

    tokio::spawn(async move {
        loop {
            match appended.recv().await {
                Ok(order_id) => info!("🔍 Order {} appended, reconciling", order_id),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Reconciler missed {} append notifications", missed)
                }
                Err(RecvError::Closed) => break,
            }

            match order_log.list().await {
                Ok(orders) => {
                    reconciler.reconcile(&orders).await;
                }
                Err(e) => error!("Failed to read order log for reconciliation: {:?}", e),
            }
        }
        info!("Reconciler stopped");
    });
    info!("✅ Reconcile-on-append task started");
}

fn spawn_order_purge(state: &AppState) {
    let order_log = state.order_log.clone();
    let reconciler = state.reconciler.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;

            match order_log.purge_expired().await {
                Ok(count) if count > 0 => {
                    // statuses are derived from the log, nothing left to show
                    reconciler.cache().clear().await;
                    info!("🗑️  Expired {} orders", count);
                }
                Ok(_) => {}
                Err(e) => error!("Failed to purge expired orders: {:?}", e),
            }
        }
    });
    info!("✅ Order expiry task started (every {}s)", PURGE_INTERVAL.as_secs());
}
