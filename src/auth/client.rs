//! # Authenticated Client Module
//!
//! HTTP clients bound to one partner base URL that authenticate every
//! outbound request with a freshly fetched bearer token.
//!
//! ## Request Flow
//!
//! 1. Fetch a token from the partner's self token endpoint ([`TokenSource`])
//! 2. Decorate the request: `Authorization`, `Accept` and the profile headers
//! 3. Send it to the partner
//! 4. Inspect the response: 2xx passes through, 401 is logged, every non-2xx
//!    becomes [`ClientError::Status`]
//!
//! A failed token fetch aborts the call before anything reaches the partner.
//! Nothing is cached and nothing is retried.
//!
//! ## Profiles
//!
//! Partners differ in the headers they expect, so one client exists per
//! distinct header set rather than per route:
//!
//! - `Standard`: `Accept: application/json`
//! - `JsonQuery`: JSON content type plus `X-HTTP-Method-Override: GET`
//! - `JsonBody`: JSON content type

use super::source::TokenSource;
use super::types::{AccessToken, Partner};
use crate::error::{ClientError, TokenError};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Header used by gateways to treat a request as a GET
pub const METHOD_OVERRIDE: HeaderName = HeaderName::from_static("x-http-method-override");

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Header sets applied on top of the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProfile {
    Standard,
    JsonQuery,
    JsonBody,
}

impl ClientProfile {
    /// Extra headers carried by every request of this profile
    pub fn extra_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            ClientProfile::Standard => {}
            ClientProfile::JsonQuery => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers.insert(METHOD_OVERRIDE, HeaderValue::from_static("GET"));
            }
            ClientProfile::JsonBody => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }
        headers
    }
}

/// Partner client attaching a fresh bearer token to every request
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    http: reqwest::Client,
    base_url: String,
    token_source: TokenSource,
    extra_headers: HeaderMap,
}

impl AuthenticatedClient {
    /// Bind `base_url` to a token source and the headers every request carries
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        token_source: TokenSource,
        extra_headers: HeaderMap,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_source,
            extra_headers,
        }
    }

    /// Shorthand for [`AuthenticatedClient::new`] with a profile's headers
    pub fn with_profile(
        http: reqwest::Client,
        base_url: &str,
        token_source: TokenSource,
        profile: ClientProfile,
    ) -> Self {
        Self::new(http, base_url, token_source, profile.extra_headers())
    }

    pub fn partner(&self) -> Partner {
        self.token_source.partner()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Self token endpoint this client obtains its tokens from
    pub fn token_url(&self) -> &str {
        self.token_source.url()
    }

    /// `GET` a partner path; `query` pairs are URL encoded and appended
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        let url = self.url(path);
        let mut builder = self.http.get(&url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        self.execute("GET", &url, builder).await
    }

    /// `POST` a JSON body to a partner path
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, ClientError> {
        let url = self.url(path);
        let builder = self.http.post(&url).json(body);
        self.execute("POST", &url, builder).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        method: &str,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<Value, ClientError> {
        // The token must resolve before anything is sent
        let token = self.token_source.access_token().await?;
        let builder = decorate(builder, &token, &self.extra_headers)?;

        let response = builder.send().await?;
        info!(
            partner = %self.partner(),
            "[{}] {} - {}",
            method,
            response.status().as_u16(),
            url
        );

        let response = inspect(response).await?;
        let body = response.bytes().await?;
        if body.is_empty() {
            debug!(partner = %self.partner(), "Partner answered with an empty body");
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Attach the bearer token, the JSON `Accept` header and `extra_headers`.
///
/// Applied after the route has set method, URL, query and body, so the
/// profile headers take precedence over anything set earlier. A token that
/// cannot be sent as a header value is an error, so no request leaves
/// without credentials.
pub fn decorate(
    builder: RequestBuilder,
    token: &AccessToken,
    extra_headers: &HeaderMap,
) -> Result<RequestBuilder, ClientError> {
    let mut headers = HeaderMap::new();
    let authorization = HeaderValue::from_str(&token.bearer()).map_err(|_| {
        warn!("Access token contains characters not allowed in a header");
        TokenError::InvalidToken
    })?;
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in extra_headers {
        headers.insert(name.clone(), value.clone());
    }
    Ok(builder.headers(headers))
}

/// Pass 2xx responses through; turn anything else into a [`ClientError`].
///
/// A 401 means the partner refused the token. It is logged and reported like
/// any other failure: nothing is retried and there is no cache to invalidate.
pub async fn inspect(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        warn!(url = %response.url(), "Invalid token or expired token.");
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
