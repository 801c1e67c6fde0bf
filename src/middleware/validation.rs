use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Reject a JSON body that fails to parse or validate as `T` before the
/// handler sees it
pub async fn validate_json<T: DeserializeOwned + Validate>(
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::InvalidInput("Invalid request body".to_string()))?;

    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON: {}", e)))?;

    value
        .validate()
        .map_err(|e| AppError::InvalidInput(format!("Validation failed: {}", describe(&e))))?;

    // Rebuild the request with the validated body
    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

/// `field: message` pairs, sorted by field
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect();
    fields.sort();
    fields.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::SelectionRequest;

    #[test]
    fn test_describe_names_each_field() {
        let request = SelectionRequest {
            chain: String::new(),
            token: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            describe(&errors),
            "chain: chain is required; token: token is required"
        );
    }
}
