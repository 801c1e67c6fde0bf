use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    error::{AppResult, LedgerError},
    ledger::{
        models::{
            ApiEnvelope, Portfolio, StatusPage, TokenInfo, TokenPage, TransferReceipt,
            TransferRequest,
        },
        traits::LedgerGateway,
    },
};

const TRANSFER_PATH: &str = "/api/v1/transfers/tokens/execute";
const ORDERS_PATH: &str = "/api/v1/orders";
const PORTFOLIO_PATH: &str = "/api/v1/portfolio";
const TOKENS_PATH: &str = "/api/v1/supported/tokens";
const TOKEN_PAGE_SIZE: u32 = 50;
const MAX_TOKEN_PAGES: u32 = 100;

#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    pub base_url: String,
    pub api_key: String,
    pub auth_token: String,
    /// Transport level ceiling; callers apply their own tighter bounds
    pub request_timeout: Duration,
}

/// REST adapter for the custodial wallet API
pub struct HttpLedgerClient {
    config: HttpLedgerConfig,
    client: Client,
}

impl HttpLedgerClient {
    pub fn new(config: HttpLedgerConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(LedgerError::from)?;

        info!("Ledger client configured for {}", config.base_url);
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn read_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Ledger {} answered {}: {}", path, status, body);
            return Err(LedgerError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(|e| LedgerError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })?;

        if let Some(state) = envelope.status.as_deref() {
            if !state.eq_ignore_ascii_case("success") {
                return Err(LedgerError::Rejected(format!("{} returned status {}", path, state)).into());
            }
        }

        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("x-api-key", &self.config.api_key)
            .bearer_auth(&self.config.auth_token)
            .query(query)
            .send()
            .await
            .map_err(LedgerError::from)?;

        self.read_envelope(path, response).await
    }
}

#[async_trait]
impl LedgerGateway for HttpLedgerClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt> {
        debug!(
            "Submitting transfer of {} to {} on {}",
            request.quantity, request.recipient_address, request.network_name
        );

        let response = self
            .client
            .post(self.url(TRANSFER_PATH))
            .header("x-api-key", &self.config.api_key)
            .bearer_auth(&self.config.auth_token)
            .json(request)
            .send()
            .await
            .map_err(LedgerError::from)?;

        self.read_envelope(TRANSFER_PATH, response).await
    }

    async fn query_status(&self, order_id: &str, offset: u32, limit: u32) -> AppResult<StatusPage> {
        self.get(
            ORDERS_PATH,
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("order_id", order_id.to_string()),
            ],
        )
        .await
    }

    async fn get_balance(&self, chain: &str, token: &str) -> AppResult<Decimal> {
        let portfolio: Portfolio = self.get(PORTFOLIO_PATH, &[]).await?;

        let balance = portfolio
            .tokens
            .iter()
            .find(|t| t.matches(chain, token))
            .map(|t| t.balance())
            .unwrap_or(Decimal::ZERO);

        debug!("Balance for {} on {}: {}", token, chain, balance);
        Ok(balance)
    }

    async fn supported_tokens(&self) -> AppResult<Vec<TokenInfo>> {
        collect_token_pages(TOKEN_PAGE_SIZE as usize, MAX_TOKEN_PAGES, |page| async move {
            let batch: TokenPage = self
                .get(
                    TOKENS_PATH,
                    &[("page", page.to_string()), ("size", TOKEN_PAGE_SIZE.to_string())],
                )
                .await?;
            Ok(batch.tokens)
        })
        .await
    }
}

/// Walk 1-based token pages until a short page, a page identical to the
/// previous one (a ledger ignoring `page`), or `max_pages`.
async fn collect_token_pages<F, Fut>(page_size: usize, max_pages: u32, mut fetch: F) -> AppResult<Vec<TokenInfo>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<Vec<TokenInfo>>>,
{
    let mut tokens = Vec::new();
    let mut previous: Option<Vec<TokenInfo>> = None;

    for page in 1..=max_pages {
        let batch = fetch(page).await?;

        if previous.as_ref() == Some(&batch) {
            warn!("Token page {} repeats page {}, stopping", page, page - 1);
            return Ok(tokens);
        }

        let short = batch.len() < page_size;
        tokens.extend(batch.iter().cloned());
        if short {
            return Ok(tokens);
        }
        previous = Some(batch);
    }

    warn!("Token listing still full after {} pages, stopping", max_pages);
    Ok(tokens)
}
