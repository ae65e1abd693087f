use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Partner APIs relayed by Ding Connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partner {
    Ding,
    Amadeus,
}

impl Partner {
    pub const ALL: [Partner; 2] = [Partner::Ding, Partner::Amadeus];

    /// Parse a partner name as accepted on the command line
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ding" => Some(Partner::Ding),
            "amadeus" => Some(Partner::Amadeus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Partner::Ding => "ding",
            Partner::Amadeus => "amadeus",
        }
    }

    /// Path of the self token endpoint serving this partner's tokens
    pub fn token_path(&self) -> &'static str {
        match self {
            Partner::Ding => "/ding-access-token",
            Partner::Amadeus => "/amadeus-access-token",
        }
    }
}

impl fmt::Display for Partner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client credentials issued by a partner's identity service
#[derive(Clone, PartialEq)]
pub struct CredentialPair {
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialPair {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

// Secrets stay out of logs and panics
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Token response as relayed by the self token endpoint
#[derive(Deserialize, Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    // Partner specific metadata (scope, application_name, state, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessToken {
    /// Value of the `Authorization` header carrying this token
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &redact(&self.access_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Shorten a credential for diagnostics, keeping only its first characters
pub fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{}…", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_from_str() {
        assert_eq!(Partner::from_str("ding"), Some(Partner::Ding));
        assert_eq!(Partner::from_str("AMADEUS"), Some(Partner::Amadeus));
        assert_eq!(Partner::from_str("paypal"), None);
    }

    #[test]
    fn test_token_paths() {
        assert_eq!(Partner::Ding.token_path(), "/ding-access-token");
        assert_eq!(Partner::Amadeus.token_path(), "/amadeus-access-token");
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let credentials = CredentialPair::new("client", "super-secret");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("client"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_access_token_keeps_partner_metadata() {
        let token: AccessToken = serde_json::from_value(serde_json::json!({
            "type": "amadeusOAuth2Token",
            "access_token": "abc123",
            "token_type": "Bearer",
            "expires_in": 1799,
            "state": "approved"
        }))
        .unwrap();

        assert_eq!(token.bearer(), "Bearer abc123");
        assert_eq!(token.expires_in, Some(1799));
        assert_eq!(token.extra.get("state"), Some(&Value::from("approved")));
        assert!(!format!("{:?}", token).contains("abc123"));
    }

    #[test]
    fn test_access_token_requires_access_token_field() {
        let result = serde_json::from_value::<AccessToken>(serde_json::json!({
            "error": "invalid_client"
        }));
        assert!(result.is_err());
    }
}
