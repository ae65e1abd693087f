//! Token retrieval through the self token endpoints.
//!
//! Authenticated clients never talk to identity services directly. They ask
//! this relay's own `/{partner}-access-token` endpoint over a plain HTTP
//! client, so every partner is handled the same way whatever its credential
//! scheme. A [`TokenSource`] only ever owns an unauthenticated
//! `reqwest::Client`: token retrieval cannot re-enter an authenticated client.

use super::types::{AccessToken, Partner, redact};
use crate::error::TokenError;
use reqwest::header::ACCEPT;
use tracing::{debug, error};

/// Fetches a fresh access token from a self token endpoint
#[derive(Debug, Clone)]
pub struct TokenSource {
    http: reqwest::Client,
    partner: Partner,
    url: String,
}

impl TokenSource {
    /// Token source for `partner`, served by the relay reachable at `self_base_url`
    pub fn new(http: reqwest::Client, self_base_url: &str, partner: Partner) -> Self {
        let url = format!(
            "{}{}",
            self_base_url.trim_end_matches('/'),
            partner.token_path()
        );
        Self { http, partner, url }
    }

    pub fn partner(&self) -> Partner {
        self.partner
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch a new token. Nothing is cached: every call is a new request.
    pub async fn access_token(&self) -> Result<AccessToken, TokenError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(partner = %self.partner, "Self token endpoint unreachable: {}", e);
                TokenError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(partner = %self.partner, status = status.as_u16(), "Self token endpoint failed");
            return Err(TokenError::Endpoint {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|source| TokenError::Decode { status, source })?;

        // Identity services answer errors with a JSON body lacking the token
        let token: AccessToken =
            serde_json::from_value(value).map_err(|_| TokenError::MissingAccessToken)?;

        debug!(partner = %self.partner, token = %redact(&token.access_token), "Obtained access token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_joins_base_and_token_path() {
        let source = TokenSource::new(reqwest::Client::new(), "http://localhost:3000/", Partner::Amadeus);
        assert_eq!(source.url(), "http://localhost:3000/amadeus-access-token");
    }

    #[tokio::test]
    async fn test_access_token_reads_self_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ding-access-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ding-token",
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": "topupapi"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = TokenSource::new(reqwest::Client::new(), &server.uri(), Partner::Ding);
        let token = source.access_token().await.unwrap();
        assert_eq!(token.access_token, "ding-token");
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
    }

    #[tokio::test]
    async fn test_access_token_fails_on_endpoint_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let source = TokenSource::new(reqwest::Client::new(), &server.uri(), Partner::Ding);
        let result = source.access_token().await;
        assert!(matches!(result, Err(TokenError::Endpoint { .. })));
    }

    #[tokio::test]
    async fn test_access_token_fails_without_token_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let source = TokenSource::new(reqwest::Client::new(), &server.uri(), Partner::Amadeus);
        let result = source.access_token().await;
        assert!(matches!(result, Err(TokenError::MissingAccessToken)));
    }
}
