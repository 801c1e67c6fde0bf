use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Submission rejected: {0}")]
    Submission(#[from] SubmissionError),

    #[error("A batch is already being executed")]
    BatchInFlight,

    #[error("Token {token} is not supported on {chain}")]
    TokenNotFound { chain: String, token: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures talking to the external ledger service
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("Ledger returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Call to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("Rejected by ledger: {0}")]
    Rejected(String),
}

/// Reasons the balance guard refuses a batch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Batch has no entries")]
    EmptyBatch,

    #[error("Entry {sequence} has no recipient")]
    MissingRecipient { sequence: u32 },

    #[error("Batch total must be greater than zero")]
    NonPositiveTotal,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    #[error("No chain/token selected")]
    NoSelection,
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::Submission(SubmissionError::InsufficientBalance { required, available }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_BALANCE",
                format!("Batch total {} exceeds available balance {}", required, available),
                Some(serde_json::json!({
                    "required": required.to_string(),
                    "available": available.to_string(),
                })),
            ),
            AppError::Submission(SubmissionError::MissingRecipient { sequence }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_RECIPIENT",
                format!("Entry {} has no recipient", sequence),
                Some(serde_json::json!({"sequence": sequence})),
            ),
            AppError::Submission(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SUBMISSION_REJECTED",
                err.to_string(),
                None,
            ),
            AppError::BatchInFlight => (
                StatusCode::CONFLICT,
                "BATCH_IN_FLIGHT",
                "A batch is already being executed".to_string(),
                None,
            ),
            AppError::TokenNotFound { chain, token } => (
                StatusCode::BAD_REQUEST,
                "TOKEN_NOT_FOUND",
                format!("Token {} is not supported on {}", token, chain),
                Some(serde_json::json!({"chain": chain, "token": token})),
            ),
            AppError::Ledger(err) => (
                StatusCode::BAD_GATEWAY,
                "LEDGER_ERROR",
                err.to_string(),
                None,
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                msg,
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        let endpoint = error
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if error.is_timeout() {
            LedgerError::Timeout { endpoint }
        } else if error.is_decode() {
            LedgerError::Decode { endpoint, message: error.to_string() }
        } else {
            LedgerError::Request { endpoint, message: error.to_string() }
        }
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
