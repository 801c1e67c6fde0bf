use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::ledger::models::{StatusPage, TokenInfo, TransferReceipt, TransferRequest};

/// The external ledger capability the disbursement engine runs against.
///
/// Implemented by the HTTP adapter in production and by an in-memory stub
/// in tests.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Submit one transfer. `Ok` with no order id is still a failed transfer.
    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt>;

    /// Page through the status history of a ledger order
    async fn query_status(&self, order_id: &str, offset: u32, limit: u32) -> AppResult<StatusPage>;

    /// Spendable balance of `token` on `chain`
    async fn get_balance(&self, chain: &str, token: &str) -> AppResult<Decimal>;

    async fn supported_tokens(&self) -> AppResult<Vec<TokenInfo>>;

    /// Resolve the token address the ledger expects for a (chain, token) pair
    async fn resolve_token(&self, chain: &str, token: &str) -> AppResult<TokenInfo> {
        self.supported_tokens()
            .await?
            .into_iter()
            .find(|t| t.network_name == chain && t.token_name == token)
            .ok_or_else(|| AppError::TokenNotFound {
                chain: chain.to_string(),
                token: token.to_string(),
            })
    }
}
