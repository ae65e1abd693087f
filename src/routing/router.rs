//! # Router Module
//!
//! Builds the relay's Axum router.
//!
//! ## Features
//!
//! - **Token endpoints**: `/ding-access-token` and `/amadeus-access-token`
//! - **Ding relay**: informational endpoints and `/SendTransfer`
//! - **Amadeus relay**: flight search, pricing, booking and hotel search
//! - **Static files**: anything unmatched is served from the static directory
//! - **CORS**: any origin, method and header
//! - **Observability**: HTTP tracing layer on every request

use super::{amadeus, ding, tokens};
use crate::AppState;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub const WELCOME_MESSAGE: &str = "Welcome to Ding connect backend api";

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(|| async { "OK" }))
        .merge(tokens::routes())
        .merge(ding::routes())
        .merge(amadeus::routes())
        .fallback_service(static_files)
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
// Tests for the router are in the tests module
