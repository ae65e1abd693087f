//! # Authentication Module
//!
//! Token relay for the partner APIs behind Ding Connect.
//!
//! Partner calls are authenticated in two steps:
//!
//! 1. The relay exposes one self token endpoint per partner
//!    (`/ding-access-token`, `/amadeus-access-token`) backed by a
//!    [`oauth::TokenFetcher`] performing the client credentials grant.
//! 2. [`client::AuthenticatedClient`]s obtain a token from that endpoint
//!    through a [`source::TokenSource`] for every outbound request and attach
//!    it as `Authorization: Bearer <token>`.
//!
//! Tokens are never cached. Each partner call costs one token fetch.
//!
//! ## Sub-modules
//!
//! - `types`: partners, credentials and token responses
//! - `oauth`: client credentials grant against the identity services
//! - `source`: token retrieval through the self token endpoints
//! - `client`: authenticated partner clients

pub mod client;
pub mod oauth;
pub mod source;
pub mod types;

use client::{AuthenticatedClient, ClientProfile};
use oauth::TokenFetcher;
use source::TokenSource;
use types::Partner;

use crate::env::AppConfig;

/// Token fetchers backing the self token endpoints
#[derive(Debug, Clone)]
pub struct TokenFetchers {
    pub ding: TokenFetcher,
    pub amadeus: TokenFetcher,
}

impl TokenFetchers {
    pub fn from_config(http: &reqwest::Client, config: &AppConfig) -> Self {
        Self {
            ding: TokenFetcher::new(
                http.clone(),
                Partner::Ding,
                config.ding.token_url.clone(),
                config.ding.credentials.clone(),
            ),
            amadeus: TokenFetcher::new(
                http.clone(),
                Partner::Amadeus,
                config.amadeus.token_url.clone(),
                config.amadeus.credentials.clone(),
            ),
        }
    }

    pub fn for_partner(&self, partner: Partner) -> &TokenFetcher {
        match partner {
            Partner::Ding => &self.ding,
            Partner::Amadeus => &self.amadeus,
        }
    }
}

/// Authenticated clients, one per partner and header profile
#[derive(Debug, Clone)]
pub struct PartnerClients {
    /// Ding REST API
    pub ding: AuthenticatedClient,
    /// Amadeus searches, sent with `X-HTTP-Method-Override: GET`
    pub amadeus: AuthenticatedClient,
    /// Amadeus pricing and booking
    pub amadeus_post: AuthenticatedClient,
}

impl PartnerClients {
    /// Build every partner client.
    ///
    /// Token sources get the plain `http` client and reach the relay through
    /// `config.self_base_url`.
    pub fn from_config(http: &reqwest::Client, config: &AppConfig) -> Self {
        let ding_tokens = TokenSource::new(http.clone(), &config.self_base_url, Partner::Ding);
        let amadeus_tokens =
            TokenSource::new(http.clone(), &config.self_base_url, Partner::Amadeus);

        Self {
            ding: AuthenticatedClient::with_profile(
                http.clone(),
                &config.ding.base_url,
                ding_tokens,
                ClientProfile::Standard,
            ),
            amadeus: AuthenticatedClient::with_profile(
                http.clone(),
                &config.amadeus.base_url,
                amadeus_tokens.clone(),
                ClientProfile::JsonQuery,
            ),
            amadeus_post: AuthenticatedClient::with_profile(
                http.clone(),
                &config.amadeus.base_url,
                amadeus_tokens,
                ClientProfile::JsonBody,
            ),
        }
    }
}
