//! Server module for the Ding Connect relay.
//!
//! # Features
//!
//! - **Relay Server**: binds the configured address and serves the router
//!   until Ctrl+C or SIGTERM
//! - **Sandbox**: runs the relay against the local sandbox identity and
//!   partner servers for development
//! - **Serving Helper**: [`serve`] runs the router on an already bound
//!   listener, which lets tests bind `127.0.0.1:0` and learn the port first
//!
//! # Usage
//!
//! ```rust,ignore
//! // Relay against the configured partners
//! start_server(config).await?;
//!
//! // Relay against the sandbox on port 3001
//! start_sandbox(config, 3001).await?;
//! ```

pub mod shutdown;

use self::shutdown::ShutdownCoordinator;
use crate::AppState;
use crate::auth::types::{CredentialPair, Partner};
use crate::env::AppConfig;
use crate::error::ServerError;
use crate::routing::router::create_router;
use crate::sandbox::{self, SANDBOX_TOKEN_PATH};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Credentials the relay presents to the sandbox when none are configured
const SANDBOX_CREDENTIALS: (&str, &str) = ("sandbox-client", "sandbox-secret");

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Start the relay with graceful shutdown support
pub async fn start_server(config: AppConfig) -> Result<(), ServerError> {
    let shutdown_coordinator = ShutdownCoordinator::new();
    run_relay(config, shutdown_coordinator).await
}

/// Start the sandbox and the relay wired to it, used for local development
pub async fn start_sandbox(mut config: AppConfig, port: u16) -> Result<(), ServerError> {
    let shutdown_coordinator = ShutdownCoordinator::new();

    let sandbox_bind = SocketAddr::new(config.bind_address.ip(), port);
    let listener = bind(sandbox_bind).await?;
    let sandbox_addr = listener.local_addr().map_err(ServerError::Serve)?;
    let sandbox_url = format!("http://127.0.0.1:{}", sandbox_addr.port());
    info!("Sandbox running on http://{}", sandbox_addr);

    for partner in Partner::ALL {
        point_at_sandbox(&mut config, partner, &sandbox_url);
    }

    let sandbox_shutdown = shutdown_coordinator.clone();
    let sandbox_handle = tokio::spawn(sandbox::serve(listener, async move {
        sandbox_shutdown.shutdown_requested().await;
    }));

    info!("Both servers are running. Press Ctrl+C to shutdown...");
    let result = run_relay(config, shutdown_coordinator).await;

    match sandbox_handle.await {
        Ok(Ok(())) => info!("Sandbox shutdown complete"),
        Ok(Err(e)) => warn!("Sandbox stopped with an error: {}", e),
        Err(e) => warn!("Sandbox task failed: {}", e),
    }

    result
}

/// Bind a TCP listener, reporting the address on failure
pub async fn bind(address: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })
}

/// Serve the relay router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

async fn run_relay(
    config: AppConfig,
    shutdown_coordinator: ShutdownCoordinator,
) -> Result<(), ServerError> {
    let listener = bind(config.bind_address).await?;
    let addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!("Ding Connect running on http://{}", addr);
    info!("Web interface: http://{}:{}/ ({})", config.host, config.port, config.static_dir);

    let app_state = AppState::from_config(config)?;
    for client in [&app_state.clients.ding, &app_state.clients.amadeus] {
        info!(
            "Relaying {} to {} (tokens from {})",
            client.partner(),
            client.base_url(),
            client.token_url()
        );
    }

    let result = serve(listener, app_state, async move {
        shutdown_coordinator.wait_for_shutdown_signal().await;
    })
    .await;

    info!("Ding Connect shutdown complete");
    result
}

/// Send a partner's token and API traffic to the sandbox
fn point_at_sandbox(config: &mut AppConfig, partner: Partner, sandbox_url: &str) {
    let partner_config = match partner {
        Partner::Ding => &mut config.ding,
        Partner::Amadeus => &mut config.amadeus,
    };

    partner_config.base_url = sandbox_url.to_string();
    partner_config.token_url = format!("{}{}", sandbox_url, SANDBOX_TOKEN_PATH);
    if !partner_config.credentials.is_complete() {
        let (client_id, client_secret) = SANDBOX_CREDENTIALS;
        partner_config.credentials = CredentialPair::new(client_id, client_secret);
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
