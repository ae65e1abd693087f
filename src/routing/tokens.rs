//! Self token endpoints.
//!
//! `GET /ding-access-token` and `GET /amadeus-access-token` run the partner's
//! client credentials grant and answer with the identity service's JSON
//! unchanged. Authenticated clients fetch their tokens here.

use crate::AppState;
use crate::auth::types::Partner;
use crate::error::RelayError;
use axum::{Json, Router, extract::State, routing::get};
use serde_json::Value;
use tracing::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(Partner::Ding.token_path(), get(ding_access_token))
        .route(Partner::Amadeus.token_path(), get(amadeus_access_token))
}

async fn ding_access_token(State(state): State<AppState>) -> Result<Json<Value>, RelayError> {
    relay_access_token(&state, Partner::Ding).await
}

async fn amadeus_access_token(State(state): State<AppState>) -> Result<Json<Value>, RelayError> {
    relay_access_token(&state, Partner::Amadeus).await
}

/// Fetch a token for `partner` and relay the identity service's answer
pub async fn relay_access_token(
    state: &AppState,
    partner: Partner,
) -> Result<Json<Value>, RelayError> {
    info!("[GET] {}", partner.token_path());
    let token = state.tokens.for_partner(partner).fetch().await?;
    Ok(Json(token))
}
