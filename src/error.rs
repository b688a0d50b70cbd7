//! Error types for shinime
//!
//! [`AppError`] is what the gateway's HTTP handlers return; it renders the
//! `{"error": "..."}` envelope. [`ClientError`] is the single normalized
//! error every [`crate::client::AnimeClient`] operation surfaces.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::models::GatewayErrorBody;

/// Gateway-side error type that unifies all relay failures
#[derive(Debug, Error)]
pub enum AppError {
    /// Relay failures (bad request body, network, upstream JSON)
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Unknown route
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            // Every relay failure is a 500, including unparseable request bodies
            AppError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the error envelope
    pub fn user_message(&self) -> String {
        match self {
            AppError::Gateway(err) => err.to_string(),
            AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(GatewayErrorBody::new(self.user_message()))
    }
}

/// Result type alias for gateway handlers
pub type AppResult<T> = Result<T, AppError>;

/// Normalized error surfaced by every client operation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The caller supplied invalid or missing input; no request was made
    #[error("{0}")]
    Validation(String),

    /// The gateway or upstream failed, or a required field was absent
    #[error("{0}")]
    Upstream(String),

    /// The owning view cancelled the operation before it finished
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        ClientError::Upstream(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// Replace an empty message with the per-operation fallback
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            ClientError::Validation(msg) if msg.trim().is_empty() => {
                ClientError::Validation(fallback.to_string())
            }
            ClientError::Upstream(msg) if msg.trim().is_empty() => {
                ClientError::Upstream(fallback.to_string())
            }
            other => other,
        }
    }
}

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_is_internal() {
        let error = AppError::Gateway(GatewayError::Network("connection refused".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let error = AppError::Gateway(GatewayError::InvalidRequest("missing field".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_status_code() {
        let error = AppError::not_found("No route for /nope");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.user_message(), "No route for /nope");
    }

    #[test]
    fn test_gateway_user_message_is_relay_message() {
        let error = AppError::from(GatewayError::InvalidJson("expected value".to_string()));
        assert_eq!(
            error.user_message(),
            "Upstream returned invalid JSON: expected value"
        );
    }

    #[test]
    fn test_error_display() {
        let error = AppError::not_found("No route for /nope");
        assert_eq!(format!("{}", error), "Not found: No route for /nope");

        let error = AppError::from(GatewayError::Network("Connection timeout".to_string()));
        assert_eq!(
            format!("{}", error),
            "Gateway error: Failed to connect to upstream: Connection timeout"
        );
    }

    #[test]
    fn test_client_error_display_is_message() {
        assert_eq!(
            ClientError::upstream("Stream url not found.").to_string(),
            "Stream url not found."
        );
        assert_eq!(ClientError::validation("Query is required.").to_string(), "Query is required.");
        assert_eq!(ClientError::Cancelled.to_string(), "Request cancelled");
    }

    #[test]
    fn test_or_message_fills_empty_only() {
        let error = ClientError::upstream("").or_message("Failed to fetch genres");
        assert_eq!(error, ClientError::upstream("Failed to fetch genres"));

        let error = ClientError::upstream("quota exceeded").or_message("Failed to fetch genres");
        assert_eq!(error, ClientError::upstream("quota exceeded"));

        assert_eq!(
            ClientError::Cancelled.or_message("Failed to fetch genres"),
            ClientError::Cancelled
        );
    }
}
