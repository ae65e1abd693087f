//! # Ding Connect
//!
//! Backend relay for the Ding top-up and Amadeus travel APIs.
//!
//! The relay holds the partner client credentials, exposes self token
//! endpoints backed by the client credentials grant, and forwards frontend
//! calls to the partner APIs with a freshly obtained bearer token attached.
//!
//! ## Modules
//!
//! - `auth`: token fetchers, token sources and authenticated partner clients
//! - `routing`: token, Ding and Amadeus routes plus the router itself
//! - `server`: listener setup and graceful shutdown
//! - `sandbox`: local identity and partner servers for development
//! - `env`: environment validation into [`env::AppConfig`]
//! - `cli`: command line entry points

mod auth;
mod cli;
mod env;
mod error;
mod http;
mod routing;
mod sandbox;
mod server;
#[cfg(test)]
mod tests;

use auth::{PartnerClients, TokenFetchers};
use env::AppConfig;
use error::ServerError;
use http::{HttpClientConfig, create_http_client};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Client credentials grants behind the self token endpoints
    pub tokens: TokenFetchers,
    /// Authenticated partner clients
    pub clients: PartnerClients,
}

impl AppState {
    /// Build the outbound HTTP client and every partner component from `config`
    pub fn from_config(config: AppConfig) -> Result<Self, ServerError> {
        let http = create_http_client(&HttpClientConfig::from_app_config(&config))?;
        let tokens = TokenFetchers::from_config(&http, &config);
        let clients = PartnerClients::from_config(&http, &config);

        Ok(Self {
            config: Arc::new(config),
            tokens,
            clients,
        })
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Main                                 ****//
///////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() {
    // Loaded before logging so RUST_LOG can come from .env; reported once it is up
    let dotenv_path = env::tolerate_missing_env_file(dotenvy::dotenv());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG_LEVEL)),
        )
        .init();

    match dotenv_path {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    cli::parse_cli_commands().await;
}
