use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use super::models::*;
use crate::{
    batch::{DisbursementService, DraftSummary, SubmitOptions, TransferEntry},
    error::{AppError, AppResult},
    ledger::{models::TokenInfo, LedgerGateway},
    orders::{newest_first, Order, OrderLog},
    reconcile::{ExplorerRegistry, ReconciliationEngine},
};

#[derive(Clone)]
pub struct AppState {
    pub service: DisbursementService,
    pub reconciler: Arc<ReconciliationEngine>,
    pub order_log: Arc<dyn OrderLog>,
    pub explorer: Arc<ExplorerRegistry>,
    pub gateway: Arc<dyn LedgerGateway>,
}

/// GET /draft
pub async fn get_draft(State(state): State<AppState>) -> AppResult<Json<DraftSummary>> {
    Ok(Json(state.service.summarize().await?))
}

/// PUT /draft/selection
pub async fn select_token(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> AppResult<Json<DraftSummary>> {
    info!("Selected {} on {}", request.token, request.chain);
    state.service.select(&request.chain, &request.token);
    Ok(Json(state.service.summarize().await?))
}

/// POST /draft/import
///
/// Body is the raw delimited text, header line first.
pub async fn import_draft(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<ImportResponse>> {
    let normalized = state.service.import(&body);
    Ok(Json(ImportResponse {
        entries: normalized.entries,
        skipped: normalized.skipped,
    }))
}

/// POST /draft/rows
pub async fn add_row(State(state): State<AppState>) -> AppResult<Json<TransferEntry>> {
    Ok(Json(state.service.add_row()))
}

/// PUT /draft/rows/:index
pub async fn update_row(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(request): Json<UpdateRowRequest>,
) -> AppResult<Json<TransferEntry>> {
    let entry = state
        .service
        .update_row(index, request.field, &request.value)?;
    Ok(Json(entry))
}

/// POST /draft/check - first guard checkpoint
pub async fn check_draft(State(state): State<AppState>) -> AppResult<Json<DraftSummary>> {
    Ok(Json(state.service.check_draft().await?))
}

/// POST /draft/submit - second guard checkpoint, then execution
pub async fn submit_draft(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<Order>> {
    info!("📨 Draft submitted");

    let order = state
        .service
        .submit_draft(SubmitOptions {
            expected_balance: request.expected_balance,
            max_fees: request.max_fees.unwrap_or(Decimal::ZERO),
        })
        .await?;

    Ok(Json(order))
}

/// GET /orders - history, newest first
pub async fn list_orders(State(state): State<AppState>) -> AppResult<Json<Vec<OrderView>>> {
    let orders = newest_first(state.order_log.list().await?);
    let statuses = state.reconciler.cache().snapshot().await;

    Ok(Json(
        orders
            .iter()
            .map(|order| OrderView::build(order, &statuses, &state.explorer))
            .collect(),
    ))
}

/// POST /orders/reconcile
pub async fn reconcile_orders(State(state): State<AppState>) -> AppResult<Json<ReconcileResponse>> {
    let orders = state.order_log.list().await?;
    state.reconciler.reconcile(&orders).await;

    let mut statuses: Vec<_> = state
        .reconciler
        .cache()
        .snapshot()
        .await
        .into_values()
        .collect();
    statuses.sort_by(|a, b| a.recipient.cmp(&b.recipient));

    Ok(Json(ReconcileResponse {
        orders: orders.len(),
        statuses,
    }))
}

/// GET /explorer/:network/:tx_hash
pub async fn explorer_link(
    State(state): State<AppState>,
    Path((network, tx_hash)): Path<(String, String)>,
) -> AppResult<Json<ExplorerLinkResponse>> {
    let url = state
        .explorer
        .explorer_link(&network, &tx_hash)
        .ok_or_else(|| AppError::NotFound(format!("no explorer for network {}", network)))?;

    Ok(Json(ExplorerLinkResponse { network, tx_hash, url }))
}

/// GET /balance/:chain/:token
pub async fn get_balance(
    State(state): State<AppState>,
    Path((chain, token)): Path<(String, String)>,
) -> AppResult<Json<BalanceResponse>> {
    let balance = state.service.available_balance(&chain, &token).await?;
    Ok(Json(BalanceResponse {
        chain,
        token,
        balance: balance.to_string(),
    }))
}

/// GET /tokens
pub async fn list_tokens(State(state): State<AppState>) -> AppResult<Json<Vec<TokenInfo>>> {
    Ok(Json(state.gateway.supported_tokens().await?))
}

/// POST /session/clear - drop the order log, status cache and draft
pub async fn clear_session(State(state): State<AppState>) -> AppResult<Json<SessionClearedResponse>> {
    state.order_log.clear().await?;
    state.reconciler.cache().clear().await;
    state.service.reset_draft();

    info!("🧹 Session cleared");
    Ok(Json(SessionClearedResponse { cleared: true }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let orders = state.order_log.list().await?.len();

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        ledger: state.gateway.name().to_string(),
        batch_in_flight: state.service.executor().is_running(),
        orders,
    }))
}
