//! Router level tests.
//!
//! Every test binds a real relay on `127.0.0.1:0` and drives it with
//! `reqwest`. Identity services and partner APIs are `wiremock` servers; the
//! relay's token sources call back into the relay itself, exactly as in
//! production.


use crate::AppState;
use crate::env::validate_with;
use crate::server;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DING_TOKEN_PATH: &str = "/connect/token";
pub const AMADEUS_TOKEN_PATH: &str = "/v1/security/oauth2/token";

/// A relay running on an ephemeral port, stopped on drop
pub struct TestRelay {
    base_url: String,
    _shutdown: oneshot::Sender<()>,
}

impl TestRelay {
    /// Start a relay configured from `vars`.
    ///
    /// Host, port and the self base URL default to the bound listener.
    pub async fn spawn(vars: &[(&str, String)]) -> Self {
        let listener = server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        env.insert("DING_CONNECT_HOST".to_string(), "127.0.0.1".to_string());
        env.insert("PORT".to_string(), addr.port().to_string());
        env.entry("DING_CONNECT_BACKEND".to_string())
            .or_insert_with(|| format!("http://{}", addr));

        let config = validate_with(|name| env.get(name).cloned()).unwrap();
        let state = AppState::from_config(config).unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server::serve(listener, state, async move {
            rx.await.ok();
        }));

        Self {
            base_url: format!("http://{}", addr),
            _shutdown: tx,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Environment pointing both partners at `identity` and `partner`
pub fn partner_env(identity: &MockServer, partner: &MockServer) -> Vec<(&'static str, String)> {
    vec![
        ("DING_BASE_URL", partner.uri()),
        ("DING_TOKEN_URL", format!("{}{}", identity.uri(), DING_TOKEN_PATH)),
        ("ID", "ding-id".to_string()),
        ("SECRET", "ding-secret".to_string()),
        ("AMADEUS_BASE_URL", partner.uri()),
        ("AMADEUS_TOKEN_URL", format!("{}{}", identity.uri(), AMADEUS_TOKEN_PATH)),
        ("AMADEUS_ID", "amadeus-id".to_string()),
        ("AMADEUS_SECRET", "amadeus-secret".to_string()),
    ]
}

/// Identity mock issuing `token` on both partners' token paths
pub async fn identity_server(token: &str) -> MockServer {
    let server = MockServer::start().await;
    for token_path in [DING_TOKEN_PATH, AMADEUS_TOKEN_PATH] {
        Mock::given(method("POST"))
            .and(path(token_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;
    }
    server
}

pub async fn read_json(response: reqwest::Response) -> Value {
    response.json::<Value>().await.unwrap()
}

pub fn internal_server_error() -> Value {
    json!({ "message": "Internal Server Error" })
}

///////////////////////////////////////////////////////////////////////////////
//****                          Router Tests                             ****//
///////////////////////////////////////////////////////////////////////////////

#[tokio::test]
async fn test_welcome_and_health() {
    let identity = identity_server("unused").await;
    let partner = MockServer::start().await;
    let relay = TestRelay::spawn(&partner_env(&identity, &partner)).await;
    let client = reqwest::Client::new();

    let response = client.get(relay.url("/")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        read_json(response).await,
        json!({ "message": "Welcome to Ding connect backend api" })
    );

    let response = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let identity = identity_server("unused").await;
    let partner = MockServer::start().await;
    let relay = TestRelay::spawn(&partner_env(&identity, &partner)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(relay.url("/"))
        .header("Origin", "https://shop.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let preflight = client
        .request(reqwest::Method::OPTIONS, relay.url("/GetBalance"))
        .header("Origin", "https://shop.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();
    assert!(preflight.status().is_success());
    assert_eq!(
        preflight.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_unknown_paths_fall_back_to_static_files() {
    let static_dir = std::env::temp_dir().join(format!("ding-connect-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("hello.txt"), "hello from public").unwrap();

    let identity = identity_server("unused").await;
    let partner = MockServer::start().await;
    let mut env = partner_env(&identity, &partner);
    env.push(("DING_CONNECT_STATIC_DIR", static_dir.display().to_string()));
    let relay = TestRelay::spawn(&env).await;
    let client = reqwest::Client::new();

    let response = client.get(relay.url("/hello.txt")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello from public");

    let response = client.get(relay.url("/missing.txt")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    std::fs::remove_dir_all(&static_dir).ok();
}
