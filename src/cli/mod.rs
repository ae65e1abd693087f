//! # CLI Module
//!
//! Command line interface for the Ding Connect relay.
//!
//! ## Commands
//!
//! ### Server Operations
//! - `start`: run the relay against the configured partners
//! - `start-sandbox`: run the local sandbox and the relay wired to it
//!
//! ### Diagnostics
//! - `token`: run one client credentials grant and print the response
//! - `validate-env`: check the environment and print the configuration
//! - `env-example`: print an example `.env` file
//!
//! ## Usage Example
//!
//! ```bash
//! # Check the configuration, then start the relay
//! ding-connect validate-env
//! ding-connect start
//!
//! # Try the credentials against Amadeus
//! ding-connect token --partner amadeus
//!
//! # Local development without partner accounts
//! ding-connect start-sandbox --port 3001
//! ```

use crate::auth::types::{Partner, redact};
use crate::env::{self, AppConfig};
use crate::http::{HttpClientConfig, create_http_client};
use crate::server;
use crate::auth::oauth::TokenFetcher;
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// Port the sandbox listens on unless told otherwise
const DEFAULT_SANDBOX_PORT: u16 = 3001;

///////////////////////////////////////////////////////////////////////////////
//****                        Private Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Parser)]
#[command(name = "ding-connect")]
#[command(about = "Ding Connect backend relay for the Ding and Amadeus APIs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

///////////////////////////////////////////////////////////////////////////////
//****                         Private Types                             ****//
///////////////////////////////////////////////////////////////////////////////

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    #[command(name = "start")]
    Start,
    /// Start the sandbox identity and partner server together with the relay
    #[command(name = "start-sandbox")]
    StartSandbox {
        #[arg(long, help = "Sandbox port (default: 3001)")]
        port: Option<u16>,
    },
    /// Fetch one access token from a partner identity service and print it
    #[command(name = "token")]
    Token {
        #[arg(long, value_parser = parse_partner, help = "Partner: ding or amadeus")]
        partner: Partner,
    },
    /// Validate the environment configuration
    #[command(name = "validate-env")]
    ValidateEnv,
    /// Print an example .env file
    #[command(name = "env-example")]
    EnvExample,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub async fn parse_cli_commands() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = env::get_config();
            if let Err(e) = server::start_server(config).await {
                error!("Ding Connect server error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::StartSandbox { port } => {
            let config = env::get_config();
            let port = port.unwrap_or(DEFAULT_SANDBOX_PORT);
            if let Err(e) = server::start_sandbox(config, port).await {
                error!("Ding Connect sandbox error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Token { partner } => {
            let config = env::get_config();
            if let Err(message) = print_token(&config, partner).await {
                eprintln!("{}", message);
                std::process::exit(1);
            }
        }
        Commands::ValidateEnv => {
            let result = env::validate_environment();
            env::print_validation_results(&result);
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Commands::EnvExample => {
            print!("{}", env::generate_env_example());
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

fn parse_partner(value: &str) -> Result<Partner, String> {
    Partner::from_str(value)
        .ok_or_else(|| format!("unknown partner '{}', expected ding or amadeus", value))
}

async fn print_token(config: &AppConfig, partner: Partner) -> Result<(), String> {
    let http = create_http_client(&HttpClientConfig::from_app_config(config))
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let partner_config = config.partner(partner);
    let fetcher = TokenFetcher::new(
        http,
        partner,
        partner_config.token_url.clone(),
        partner_config.credentials.clone(),
    );

    info!("Requesting {} token from {}", partner, fetcher.token_url());
    let token = fetcher
        .fetch()
        .await
        .map_err(|e| format!("Token request failed: {}", e))?;

    if let Some(access_token) = token.get("access_token").and_then(|t| t.as_str()) {
        info!("Received {} token {}", partner, redact(access_token));
    }

    let rendered = serde_json::to_string_pretty(&token)
        .map_err(|e| format!("Failed to render token response: {}", e))?;
    println!("{}", rendered);
    Ok(())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
