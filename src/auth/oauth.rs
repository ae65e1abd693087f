//! OAuth token acquisition module
//!
//! This module performs the OAuth 2.0 client credentials grant against a
//! partner's identity service. Every call mints a new token: nothing is
//! cached, nothing is retried.
//!
//! The token endpoint answer is returned as raw JSON so the self token
//! endpoint can relay it verbatim, whatever metadata the partner adds.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::auth::oauth::TokenFetcher;
//!
//! let fetcher = TokenFetcher::new(
//!     http_client,
//!     Partner::Ding,
//!     "https://idp.ding.com/connect/token",
//!     CredentialPair::new("client_id", "client_secret"),
//! );
//!
//! let token_json = fetcher.fetch().await?;
//! ```

use super::types::{CredentialPair, Partner};
use crate::error::TokenError;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Fetches client credentials tokens from one partner's identity endpoint
#[derive(Debug, Clone)]
pub struct TokenFetcher {
    http: reqwest::Client,
    partner: Partner,
    token_url: String,
    credentials: CredentialPair,
}

///////////////////////////////////////////////////////////////////////////////
//****                        Private Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Form body of the client credentials grant, fields in wire order
#[derive(Serialize)]
struct ClientCredentialsForm<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

impl TokenFetcher {
    pub fn new(
        http: reqwest::Client,
        partner: Partner,
        token_url: impl Into<String>,
        credentials: CredentialPair,
    ) -> Self {
        Self {
            http,
            partner,
            token_url: token_url.into(),
            credentials,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Request a new access token.
    ///
    /// Issues one `POST` with a form encoded
    /// `grant_type=client_credentials&client_id=..&client_secret=..` body and
    /// parses the answer as JSON regardless of its status code. Transport
    /// failures and unparsable bodies are returned as errors.
    pub async fn fetch(&self) -> Result<Value, TokenError> {
        info!(partner = %self.partner, "Requesting access token from {}", self.token_url);

        let form = ClientCredentialsForm {
            grant_type: "client_credentials",
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
        };

        // reqwest sets Content-Length for the fixed size form body
        let response = self
            .http
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(CACHE_CONTROL, "no-cache")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(partner = %self.partner, "Access token request failed: {}", e);
                TokenError::Transport(e)
            })?;

        let status = response.status();
        info!(partner = %self.partner, "[POST] {} - {}", status.as_u16(), self.token_url);

        let body = response.bytes().await?;
        let token: Value = serde_json::from_slice(&body).map_err(|source| {
            error!(partner = %self.partner, "Access token response is not JSON: {}", source);
            TokenError::Decode { status, source }
        })?;

        if status.is_success() {
            debug!(partner = %self.partner, "Received access token response");
        } else {
            warn!(
                partner = %self.partner,
                status = status.as_u16(),
                "Identity service rejected the client credentials grant"
            );
        }

        Ok(token)
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> TokenFetcher {
        TokenFetcher::new(
            reqwest::Client::new(),
            Partner::Amadeus,
            format!("{}/v1/security/oauth2/token", server.uri()),
            CredentialPair::new("amadeus-id", "amadeus secret&1"),
        )
    }

    #[tokio::test]
    async fn test_fetch_posts_form_encoded_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/security/oauth2/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("cache-control", "no-cache"))
            .and(body_string(
                "grant_type=client_credentials&client_id=amadeus-id&client_secret=amadeus+secret%261",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "amadeusOAuth2Token",
                "access_token": "token-1",
                "token_type": "Bearer",
                "expires_in": 1799
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = fetcher(&server).fetch().await.unwrap();
        assert_eq!(token["access_token"], "token-1");
        assert_eq!(token["type"], "amadeusOAuth2Token");
    }

    #[tokio::test]
    async fn test_fetch_parses_body_regardless_of_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let token = fetcher(&server).fetch().await.unwrap();
        assert_eq!(token["error"], "invalid_client");
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = fetcher(&server).fetch().await;
        assert!(matches!(result, Err(TokenError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_fetch_reports_transport_failure() {
        let fetcher = TokenFetcher::new(
            reqwest::Client::new(),
            Partner::Ding,
            "http://127.0.0.1:1/connect/token",
            CredentialPair::new("id", "secret"),
        );

        let result = fetcher.fetch().await;
        assert!(matches!(result, Err(TokenError::Transport(_))));
    }

    #[tokio::test]
    async fn test_every_fetch_hits_identity_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "t" })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server);
        fetcher.fetch().await.unwrap();
        fetcher.fetch().await.unwrap();
    }
}
