//! Local sandbox standing in for the partner identity services and APIs.
//!
//! - `POST /connect/token` runs a form encoded client credentials grant and
//!   issues random UUID tokens for any non-empty client id and secret.
//! - `/api/V1/*`, `/v1/*`, `/v2/*` and `/v3/*` echo the request back when it
//!   carries a bearer token, and answer 401 otherwise.

use crate::error::ServerError;
use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::Request,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

pub const SANDBOX_TOKEN_PATH: &str = "/connect/token";

/// Lifetime advertised for sandbox tokens, in seconds
const TOKEN_LIFETIME_SECS: u64 = 3600;

/// Request headers included in the echo
const ECHOED_HEADERS: [&str; 4] = ["authorization", "accept", "content-type", "x-http-method-override"];

#[derive(Debug, Deserialize)]
struct TokenRequest {
    #[serde(default)]
    grant_type: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    scope: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub fn sandbox_router() -> Router {
    Router::new()
        .route(SANDBOX_TOKEN_PATH, post(token_endpoint))
        .route("/api/V1/{*path}", any(partner_echo))
        .route("/v1/{*path}", any(partner_echo))
        .route("/v2/{*path}", any(partner_echo))
        .route("/v3/{*path}", any(partner_echo))
        .layer(middleware::from_fn(log_request))
}

/// Serve the sandbox on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, sandbox_router())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    info!("Sandbox {} {} - {}", method, uri, response.status());
    response
}

async fn token_endpoint(Form(request): Form<TokenRequest>) -> Response {
    debug!(
        grant_type = %request.grant_type,
        client_id = %request.client_id,
        "Sandbox token request"
    );

    if request.grant_type != "client_credentials" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response();
    }

    if request.client_id.is_empty() || request.client_secret.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }

    Json(TokenResponse {
        access_token: Uuid::new_v4().to_string(),
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_LIFETIME_SECS,
        scope: request.scope,
    })
    .into_response()
}

async fn partner_echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| !token.is_empty());

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errors": [{ "status": 401, "title": "Unauthorized" }] })),
        )
            .into_response();
    }

    let echoed_headers: Map<String, Value> = ECHOED_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name.to_string(), Value::String(value.to_string())))
        })
        .collect();

    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": echoed_headers,
        "body": body,
    }))
    .into_response()
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
