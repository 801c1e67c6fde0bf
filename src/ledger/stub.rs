use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::{
    error::{AppResult, LedgerError},
    ledger::{
        models::{StatusPage, StatusRecord, TokenInfo, TransferReceipt, TransferRequest},
        traits::LedgerGateway,
    },
};

/// Scripted answer for a transfer to one recipient
#[derive(Debug, Clone)]
pub enum TransferScript {
    Accept(String),
    AcceptWithoutId,
    Reject,
    Stall(Duration),
}

/// Scripted answer for a status query on one order id
#[derive(Debug, Clone)]
pub enum StatusScript {
    Records(Vec<StatusRecord>),
    Error,
    Stall(Duration),
}

/// Deterministic in-memory ledger for tests
#[derive(Default)]
pub struct StubLedger {
    transfers: Mutex<HashMap<String, TransferScript>>,
    statuses: Mutex<HashMap<String, StatusScript>>,
    balances: Mutex<HashMap<(String, String), Decimal>>,
    tokens: Mutex<Vec<TokenInfo>>,
    transfer_log: Mutex<Vec<TransferRequest>>,
    status_queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, chain: &str, token: &str, address: &str) -> Self {
        self.tokens.lock().push(TokenInfo {
            token_name: token.to_string(),
            token_address: address.to_string(),
            network_name: chain.to_string(),
        });
        self
    }

    pub fn with_balance(self, chain: &str, token: &str, amount: Decimal) -> Self {
        self.set_balance(chain, token, amount);
        self
    }

    pub fn with_transfer(self, recipient: &str, script: TransferScript) -> Self {
        self.transfers.lock().insert(recipient.to_string(), script);
        self
    }

    pub fn with_status(self, order_id: &str, script: StatusScript) -> Self {
        self.statuses.lock().insert(order_id.to_string(), script);
        self
    }

    pub fn set_balance(&self, chain: &str, token: &str, amount: Decimal) {
        self.balances
            .lock()
            .insert((chain.to_string(), token.to_string()), amount);
    }

    pub fn transfers_made(&self) -> Vec<TransferRequest> {
        self.transfer_log.lock().clone()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    /// Highest number of transfers that were ever running at the same time
    pub fn max_concurrent_transfers(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerGateway for StubLedger {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.transfer_log.lock().push(request.clone());

        let script = self
            .transfers
            .lock()
            .get(&request.recipient_address)
            .cloned()
            .unwrap_or(TransferScript::Reject);

        // yield so overlapping calls would be observable
        tokio::task::yield_now().await;

        let result = match script {
            TransferScript::Accept(id) => Ok(TransferReceipt { order_id: Some(id) }),
            TransferScript::AcceptWithoutId => Ok(TransferReceipt { order_id: None }),
            TransferScript::Reject => {
                Err(LedgerError::Rejected(format!("unknown recipient {}", request.recipient_address)).into())
            }
            TransferScript::Stall(wait) => {
                tokio::time::sleep(wait).await;
                Ok(TransferReceipt { order_id: Some("late".to_string()) })
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn query_status(&self, order_id: &str, _offset: u32, limit: u32) -> AppResult<StatusPage> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);

        let script = self
            .statuses
            .lock()
            .get(order_id)
            .cloned()
            .unwrap_or(StatusScript::Records(Vec::new()));

        match script {
            StatusScript::Records(records) => {
                let jobs = records.into_iter().take(limit as usize).collect();
                Ok(StatusPage { jobs })
            }
            StatusScript::Error => Err(LedgerError::Status {
                endpoint: "/api/v1/orders".to_string(),
                status: 500,
            }
            .into()),
            StatusScript::Stall(wait) => {
                tokio::time::sleep(wait).await;
                Ok(StatusPage::default())
            }
        }
    }

    async fn get_balance(&self, chain: &str, token: &str) -> AppResult<Decimal> {
        Ok(self
            .balances
            .lock()
            .get(&(chain.to_string(), token.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn supported_tokens(&self) -> AppResult<Vec<TokenInfo>> {
        Ok(self.tokens.lock().clone())
    }
}

pub fn record(status: &str, hash: Option<&str>, network: &str) -> StatusRecord {
    StatusRecord {
        order_id: None,
        status: status.to_string(),
        transaction_hash: hash.map(str::to_string),
        network_name: Some(network.to_string()),
    }
}
