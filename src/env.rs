//! Environment variable validation and configuration module for Ding Connect
//!
//! This module provides centralized validation and configuration management
//! for all environment variables used by the Ding Connect relay. A `.env`
//! file in the working directory is loaded before validation.
//!
//! # Supported Environment Variables
//!
//! ## Server Configuration
//! - `DING_CONNECT_HOST`: Server bind address (default: "0.0.0.0")
//! - `PORT`: Server port (default: "3000")
//! - `DING_CONNECT_BACKEND`: Base URL the relay uses to reach its own token
//!   endpoints (default: "http://<HOST>:<PORT>", loopback when the host is
//!   unspecified)
//! - `DING_CONNECT_STATIC_DIR`: Directory served for unknown paths (default: "public")
//! - `DING_CONNECT_OUTBOUND_TIMEOUT_SECS`: Timeout for outbound calls (default: none)
//!
//! ## Ding
//! - `DING_BASE_URL`: Ding REST API root (default: "https://api.dingconnect.com")
//! - `DING_TOKEN_URL`: Ding identity endpoint (default: "https://idp.ding.com/connect/token")
//! - `ID` / `SECRET`: Ding client credentials
//!
//! ## Amadeus
//! - `AMADEUS_BASE_URL`: Amadeus REST API root (default: "https://test.api.amadeus.com")
//! - `AMADEUS_TOKEN_URL`: Amadeus identity endpoint
//!   (default: "https://test.api.amadeus.com/v1/security/oauth2/token")
//! - `AMADEUS_ID` / `AMADEUS_SECRET`: Amadeus client credentials
//!
//! ## Logging Configuration
//! - `RUST_LOG`: Standard Rust logging configuration
//!   (default: "ding_connect=info,tower_http=info")
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::env::{validate_environment, get_config};
//!
//! let config = get_config();
//! println!("Relay will bind to {}", config.bind_address);
//! ```

use crate::auth::types::{CredentialPair, Partner};
use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DING_BASE_URL: &str = "https://api.dingconnect.com";
pub const DEFAULT_DING_TOKEN_URL: &str = "https://idp.ding.com/connect/token";
pub const DEFAULT_AMADEUS_BASE_URL: &str = "https://test.api.amadeus.com";
pub const DEFAULT_AMADEUS_TOKEN_URL: &str = "https://test.api.amadeus.com/v1/security/oauth2/token";
pub const DEFAULT_LOG_LEVEL: &str = "ding_connect=info,tower_http=info";

/// Environment validation errors
#[derive(Debug, Clone)]
pub struct EnvValidationError {
    pub variable: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Severity level for environment validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    /// Critical errors that prevent application startup
    Critical,
    /// Warnings about missing optional variables or suboptimal configurations
    Warning,
    /// Informational messages about default values being used
    Info,
}

/// Endpoints and credentials of one partner
#[derive(Debug, Clone)]
pub struct PartnerConfig {
    pub base_url: String,
    pub token_url: String,
    pub credentials: CredentialPair,
}

/// Validated application configuration derived from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub host: String,
    pub port: u16,
    pub bind_address: SocketAddr,
    pub self_base_url: String,
    pub static_dir: String,
    pub outbound_timeout: Option<Duration>,

    // Partners
    pub ding: PartnerConfig,
    pub amadeus: PartnerConfig,

    // Logging
    pub log_level: String,
}

impl AppConfig {
    pub fn partner(&self, partner: Partner) -> &PartnerConfig {
        match partner {
            Partner::Ding => &self.ding,
            Partner::Amadeus => &self.amadeus,
        }
    }
}

/// Treat a missing `.env` file as nothing to load; keep every other failure
pub fn tolerate_missing_env_file<T>(
    result: Result<T, dotenvy::Error>,
) -> Result<Option<T>, dotenvy::Error> {
    result.map(Some).or_else(|e| if e.not_found() { Ok(None) } else { Err(e) })
}

/// Validate all environment variables and return configuration or errors
pub fn validate_environment() -> Result<AppConfig, Vec<EnvValidationError>> {
    validate_with(|name| env::var(name).ok())
}

/// Validate configuration read through `lookup` instead of the process environment
pub fn validate_with<F>(lookup: F) -> Result<AppConfig, Vec<EnvValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Server configuration
    let host = lookup("DING_CONNECT_HOST").unwrap_or_else(|| {
        warnings.push(info_default("DING_CONNECT_HOST", "Using default host '0.0.0.0'"));
        "0.0.0.0".to_string()
    });

    if IpAddr::from_str(&host).is_err() {
        errors.push(EnvValidationError {
            variable: "DING_CONNECT_HOST".to_string(),
            message: format!("Invalid IP address: {}", host),
            severity: ErrorSeverity::Critical,
        });
    }

    let port = match lookup("PORT") {
        Some(port_str) => match port_str.parse::<u16>() {
            Ok(port) => {
                if port < 1024 && port != 0 {
                    warnings.push(EnvValidationError {
                        variable: "PORT".to_string(),
                        message: format!(
                            "Using privileged port {}, may require root privileges",
                            port
                        ),
                        severity: ErrorSeverity::Warning,
                    });
                }
                port
            }
            Err(_) => {
                errors.push(EnvValidationError {
                    variable: "PORT".to_string(),
                    message: format!("Invalid port number: {}", port_str),
                    severity: ErrorSeverity::Critical,
                });
                DEFAULT_PORT
            }
        },
        None => {
            warnings.push(info_default("PORT", "Using default port 3000"));
            DEFAULT_PORT
        }
    };

    let bind_address = match IpAddr::from_str(&host) {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            // Already reported as an invalid host
            SocketAddr::from(([0, 0, 0, 0], port))
        }
    };

    let self_base_url = lookup("DING_CONNECT_BACKEND").unwrap_or_else(|| {
        let url = default_self_base_url(bind_address);
        warnings.push(info_default(
            "DING_CONNECT_BACKEND",
            &format!("Using default self base URL '{}'", url),
        ));
        url
    });
    check_url("DING_CONNECT_BACKEND", &self_base_url, false, &mut errors, &mut warnings);

    let static_dir = lookup("DING_CONNECT_STATIC_DIR").unwrap_or_else(|| "public".to_string());

    let outbound_timeout = match lookup("DING_CONNECT_OUTBOUND_TIMEOUT_SECS") {
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => {
                warnings.push(EnvValidationError {
                    variable: "DING_CONNECT_OUTBOUND_TIMEOUT_SECS".to_string(),
                    message: format!("Invalid timeout '{}', outbound calls will not time out", value),
                    severity: ErrorSeverity::Warning,
                });
                None
            }
        },
        None => None,
    };

    // Partners
    let ding = partner_config(
        &lookup,
        PartnerVariables {
            base_url: ("DING_BASE_URL", DEFAULT_DING_BASE_URL),
            token_url: ("DING_TOKEN_URL", DEFAULT_DING_TOKEN_URL),
            client_id: "ID",
            client_secret: "SECRET",
        },
        &mut errors,
        &mut warnings,
    );
    let amadeus = partner_config(
        &lookup,
        PartnerVariables {
            base_url: ("AMADEUS_BASE_URL", DEFAULT_AMADEUS_BASE_URL),
            token_url: ("AMADEUS_TOKEN_URL", DEFAULT_AMADEUS_TOKEN_URL),
            client_id: "AMADEUS_ID",
            client_secret: "AMADEUS_SECRET",
        },
        &mut errors,
        &mut warnings,
    );

    // Logging configuration
    let log_level = lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    // Add all warnings to errors for reporting
    errors.extend(warnings);

    let has_critical_errors = errors.iter().any(|e| e.severity == ErrorSeverity::Critical);
    if has_critical_errors {
        return Err(errors);
    }

    // Log non-critical issues
    for error in &errors {
        match error.severity {
            ErrorSeverity::Warning => warn!("{}: {}", error.variable, error.message),
            ErrorSeverity::Info => info!("{}: {}", error.variable, error.message),
            ErrorSeverity::Critical => {} // Already handled above
        }
    }

    Ok(AppConfig {
        host,
        port,
        bind_address,
        self_base_url,
        static_dir,
        outbound_timeout,
        ding,
        amadeus,
        log_level,
    })
}

/// Get the validated configuration, exiting if validation fails
pub fn get_config() -> AppConfig {
    match validate_environment() {
        Ok(config) => config,
        Err(errors) => {
            eprintln!("Environment validation failed:");
            for error in errors {
                match error.severity {
                    ErrorSeverity::Critical => {
                        eprintln!("CRITICAL - {}: {}", error.variable, error.message)
                    }
                    ErrorSeverity::Warning => {
                        eprintln!("WARNING - {}: {}", error.variable, error.message)
                    }
                    ErrorSeverity::Info => {
                        eprintln!("INFO - {}: {}", error.variable, error.message)
                    }
                }
            }
            std::process::exit(1);
        }
    }
}

/// Print environment validation results in a user-friendly format
pub fn print_validation_results(result: &Result<AppConfig, Vec<EnvValidationError>>) {
    match result {
        Ok(config) => {
            println!("Environment validation successful");
            println!("Configuration:");
            println!("  Server: {}", config.bind_address);
            println!("  Self base URL: {}", config.self_base_url);
            println!("  Static files: {}", config.static_dir);
            for partner in Partner::ALL {
                let partner_config = config.partner(partner);
                println!(
                    "  {}: {} (token: {}, client id: {})",
                    partner,
                    partner_config.base_url,
                    partner_config.token_url,
                    if partner_config.credentials.client_id.is_empty() {
                        "<missing>"
                    } else {
                        partner_config.credentials.client_id.as_str()
                    }
                );
            }
            match config.outbound_timeout {
                Some(timeout) => println!("  Outbound timeout: {}s", timeout.as_secs()),
                None => println!("  Outbound timeout: none"),
            }
            println!("  Log Level: {}", config.log_level);
        }
        Err(errors) => {
            let critical_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Critical)
                .count();
            let warning_count = errors
                .iter()
                .filter(|e| e.severity == ErrorSeverity::Warning)
                .count();

            eprintln!(
                "Environment validation failed with {} critical error(s), {} warning(s):",
                critical_count, warning_count
            );

            for error in errors {
                let prefix = match error.severity {
                    ErrorSeverity::Critical => "CRITICAL",
                    ErrorSeverity::Warning => "WARNING",
                    ErrorSeverity::Info => "INFO",
                };
                eprintln!("  {} - {}: {}", prefix, error.variable, error.message);
            }
        }
    }
}

/// Generate example environment configuration file
pub fn generate_env_example() -> String {
    format!(
        r#"# Ding Connect Environment Configuration
# Copy this file to .env and customize the values for your deployment

# =============================================================================
# Server Configuration
# =============================================================================

# Server bind address
# Default: 0.0.0.0 (bind to all interfaces)
DING_CONNECT_HOST=0.0.0.0

# Server port
# Default: {port}
PORT={port}

# Base URL the relay uses to reach its own token endpoints
# Default: http://<DING_CONNECT_HOST>:<PORT>, loopback when the host is 0.0.0.0 or ::
DING_CONNECT_BACKEND=http://127.0.0.1:{port}

# Directory of static files served for unknown paths
DING_CONNECT_STATIC_DIR=public

# Timeout in seconds for outbound calls (unset: no timeout)
# DING_CONNECT_OUTBOUND_TIMEOUT_SECS=30

# =============================================================================
# Ding
# =============================================================================

DING_BASE_URL={ding_base}
DING_TOKEN_URL={ding_token}
ID=your-ding-client-id
SECRET=your-ding-client-secret

# =============================================================================
# Amadeus
# =============================================================================

AMADEUS_BASE_URL={amadeus_base}
AMADEUS_TOKEN_URL={amadeus_token}
AMADEUS_ID=your-amadeus-client-id
AMADEUS_SECRET=your-amadeus-client-secret

# =============================================================================
# Logging Configuration
# =============================================================================

# Default: {log}
RUST_LOG={log}
"#,
        port = DEFAULT_PORT,
        ding_base = DEFAULT_DING_BASE_URL,
        ding_token = DEFAULT_DING_TOKEN_URL,
        amadeus_base = DEFAULT_AMADEUS_BASE_URL,
        amadeus_token = DEFAULT_AMADEUS_TOKEN_URL,
        log = DEFAULT_LOG_LEVEL,
    )
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

/// Where the relay reaches itself when `DING_CONNECT_BACKEND` is unset
fn default_self_base_url(bind_address: SocketAddr) -> String {
    let ip = match bind_address.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, bind_address.port()))
}

/// Variable names (and defaults) describing one partner
struct PartnerVariables {
    base_url: (&'static str, &'static str),
    token_url: (&'static str, &'static str),
    client_id: &'static str,
    client_secret: &'static str,
}

fn partner_config<F>(
    lookup: &F,
    vars: PartnerVariables,
    errors: &mut Vec<EnvValidationError>,
    warnings: &mut Vec<EnvValidationError>,
) -> PartnerConfig
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = url_with_default(lookup, vars.base_url, warnings);
    check_url(vars.base_url.0, &base_url, false, errors, warnings);

    let token_url = url_with_default(lookup, vars.token_url, warnings);
    check_url(vars.token_url.0, &token_url, true, errors, warnings);

    let mut credential = |name: &str| {
        lookup(name).unwrap_or_else(|| {
            warnings.push(EnvValidationError {
                variable: name.to_string(),
                message: "Not set, token requests will be rejected by the identity service"
                    .to_string(),
                severity: ErrorSeverity::Warning,
            });
            String::new()
        })
    };
    let client_id = credential(vars.client_id);
    let client_secret = credential(vars.client_secret);

    PartnerConfig {
        base_url,
        token_url,
        credentials: CredentialPair::new(client_id, client_secret),
    }
}

fn url_with_default<F>(
    lookup: &F,
    (name, default): (&str, &str),
    warnings: &mut Vec<EnvValidationError>,
) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).unwrap_or_else(|| {
        warnings.push(info_default(name, &format!("Using default URL '{}'", default)));
        default.to_string()
    })
}

/// Report unparsable URLs as critical, and plain HTTP token endpoints as warnings
fn check_url(
    variable: &str,
    value: &str,
    require_tls: bool,
    errors: &mut Vec<EnvValidationError>,
    warnings: &mut Vec<EnvValidationError>,
) {
    match reqwest::Url::parse(value) {
        Ok(url) => match url.scheme() {
            "https" => {}
            "http" if require_tls => warnings.push(EnvValidationError {
                variable: variable.to_string(),
                message: format!("{} is not encrypted, client secrets travel in clear text", value),
                severity: ErrorSeverity::Warning,
            }),
            "http" => {}
            scheme => errors.push(EnvValidationError {
                variable: variable.to_string(),
                message: format!("Unsupported scheme: {}", scheme),
                severity: ErrorSeverity::Critical,
            }),
        },
        Err(e) => errors.push(EnvValidationError {
            variable: variable.to_string(),
            message: format!("Invalid URL '{}': {}", value, e),
            severity: ErrorSeverity::Critical,
        }),
    }
}

fn info_default(variable: &str, message: &str) -> EnvValidationError {
    EnvValidationError {
        variable: variable.to_string(),
        message: message.to_string(),
        severity: ErrorSeverity::Info,
    }
}
