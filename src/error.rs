/// Unified error types for the NIP-05 service
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum Nip05Error {
    /// Identifier is not of the form `name@domain`
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// Public key is neither 64-char hex nor a valid npub
    #[error("Invalid pubkey encoding: {0}")]
    InvalidPubkeyEncoding(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for Nip05Error {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            Nip05Error::RateLimitExceeded { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };

        let (status, error_code, message) = match self {
            Nip05Error::MalformedIdentifier(_) => (
                StatusCode::BAD_REQUEST,
                "MalformedIdentifier",
                self.to_string(),
            ),
            Nip05Error::InvalidPubkeyEncoding(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidPubkeyEncoding",
                self.to_string(),
            ),
            Nip05Error::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            Nip05Error::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            Nip05Error::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Too many verification requests, please try again later".to_string(),
            ),
            Nip05Error::Config(_) | Nip05Error::Internal(_) | Nip05Error::Io(_) => {
                tracing::error!(error = %self, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Result type alias for service operations
pub type Nip05Result<T> = Result<T, Nip05Error>;
