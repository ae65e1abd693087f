//! # Outbound HTTP Client Module
//!
//! Builds the `reqwest` client shared by token fetchers, token sources and
//! partner clients. Connections to the identity services and partner APIs
//! go over rustls.
//!
//! Timeouts are left to the library unless configured: the relay has no
//! timeout contract of its own.

use crate::env::AppConfig;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::info;

/// Maximum number of redirects to follow
const MAX_REDIRECTS: usize = 5;

/// Pool idle timeout in seconds
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// User agent string for Ding Connect requests
const USER_AGENT: &str = concat!("ding-connect/", env!("CARGO_PKG_VERSION"));

/// Configuration for the outbound HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout, none by default
    pub request_timeout: Option<Duration>,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Pool idle timeout
    pub pool_idle_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            max_redirects: MAX_REDIRECTS,
            pool_idle_timeout: Duration::from_secs(POOL_IDLE_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: config.outbound_timeout,
            ..Default::default()
        }
    }
}

/// Create the outbound HTTP client
pub fn create_http_client(config: &HttpClientConfig) -> Result<Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .use_rustls_tls()
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .pool_idle_timeout(config.pool_idle_timeout);

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    let client = builder.build()?;

    match config.request_timeout {
        Some(timeout) => info!(
            "Outbound HTTP client created - timeout: {}s, max_redirects: {}",
            timeout.as_secs(),
            config.max_redirects
        ),
        None => info!(
            "Outbound HTTP client created - no timeout, max_redirects: {}",
            config.max_redirects
        ),
    }

    Ok(client)
}
