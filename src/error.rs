//! # Error Types
//!
//! Errors raised while relaying a request. Token acquisition, the partner call
//! and the route layer each have their own enum; the route layer collapses all
//! of them into the single `500 {"message":"Internal Server Error"}` envelope
//! returned to callers. The detail only ever reaches the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Message of the envelope returned for every failed relay
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Failure while obtaining an access token
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Connection refused, TLS failure, timeout
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The token response body is not JSON
    #[error("token response is not valid JSON (status {status}): {source}")]
    Decode {
        status: reqwest::StatusCode,
        #[source]
        source: serde_json::Error,
    },
    /// The self token endpoint answered with a non-success status
    #[error("token endpoint {url} answered with status {status}")]
    Endpoint {
        url: String,
        status: reqwest::StatusCode,
    },
    /// The token response has no `access_token` field
    #[error("token response does not contain an access_token")]
    MissingAccessToken,
    /// The access token cannot be carried in an `Authorization` header
    #[error("access token is not a valid header value")]
    InvalidToken,
}

/// Failure of a call made through an authenticated client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("partner request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx partner response; 401 is logged when inspected
    #[error("partner answered with status {status}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("partner response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == reqwest::StatusCode::UNAUTHORIZED)
    }
}

/// Route level failure, rendered as the generic 500 envelope
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The inbound payload could not be read
    #[error("invalid request payload: {0}")]
    Payload(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let token_rejected = matches!(&self, RelayError::Client(e) if e.is_unauthorized());
        error!(error = %self, token_rejected, "Relay failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": INTERNAL_SERVER_ERROR_MESSAGE })),
        )
            .into_response()
    }
}

/// Failure while starting the relay
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("could not build the outbound HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("could not bind {address}: {source}")]
    Bind {
        address: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relay_error_renders_generic_envelope() {
        let response = RelayError::Token(TokenError::MissingAccessToken).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "message": "Internal Server Error" }));
    }

    #[test]
    fn test_unauthorized_detection() {
        let unauthorized = ClientError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        let forbidden = ClientError::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            body: String::new(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
    }
}
