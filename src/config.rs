use std::time::Duration;

use serde::Deserialize;

use crate::error::AppResult;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bind_address: String,
    pub ledger_base_url: String,
    pub ledger_api_key: String,
    pub ledger_auth_token: String,
    /// Upper bound for a single transfer call
    pub transfer_timeout_secs: u64,
    /// Upper bound for a single status query
    pub status_timeout_secs: u64,
    pub reconcile_concurrency: usize,
    /// How long an order stays in the order log
    pub order_log_ttl_secs: u64,
    pub submit_rate_per_minute: u32,
    /// Comma separated list of CORS origins
    pub allowed_origins: String,
    /// Extra explorer templates, `NETWORK|base_url|suffix` separated by `;`
    pub explorer_templates: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self::load()?)
    }

    fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("ledger_base_url", "https://sandbox-api.okto.tech")?
            .set_default("ledger_api_key", "")?
            .set_default("ledger_auth_token", "")?
            .set_default("transfer_timeout_secs", 30)?
            .set_default("status_timeout_secs", 10)?
            .set_default("reconcile_concurrency", 8)?
            .set_default("order_log_ttl_secs", 600)?
            .set_default("submit_rate_per_minute", 10)?
            .set_default("allowed_origins", "http://localhost:3000")?
            .set_default("explorer_templates", "")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    pub fn order_log_ttl(&self) -> Duration {
        Duration::from_secs(self.order_log_ttl_secs)
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.order_log_ttl(), Duration::from_secs(600));
        assert!(config.reconcile_concurrency > 0);
    }

    #[test]
    fn test_origins_are_split_and_trimmed() {
        let mut config = Config::from_env().unwrap();
        config.allowed_origins = "http://a.test, http://b.test,,".to_string();
        assert_eq!(config.origins(), vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_load_errors_surface_as_config_errors() {
        let error = AppError::from(config::ConfigError::Message("missing field `bind_address`".to_string()));
        assert!(matches!(&error, AppError::Config(msg) if msg.contains("bind_address")));

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
