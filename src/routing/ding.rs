//! # Ding Routes
//!
//! Relays the Ding top-up API (`/api/V1/...`).
//!
//! Informational endpoints (`/GetCountries`, `/GetProducts`, ...) accept their
//! parameters through GET query strings or POST bodies and forward them as a
//! partner query string. `/SendTransfer` forwards a fixed-shape JSON payload.

use super::params::{QueryParams, RelayParams};
use crate::AppState;
use crate::error::RelayError;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// A Ding informational endpoint relayed as `GET /api/V1/<name>`
#[derive(Debug)]
pub struct DingEndpoint {
    pub name: &'static str,
    /// Parameters forwarded when present, in query order
    pub params: &'static [&'static str],
    /// Parameters the relay refuses to go without
    pub required: &'static [&'static str],
}

impl DingEndpoint {
    pub fn route(&self) -> String {
        format!("/{}", self.name)
    }

    pub fn partner_path(&self) -> String {
        format!("/api/V1/{}", self.name)
    }

    /// Query string sent to Ding for the inbound `params`
    pub fn query(&self, params: &RelayParams) -> Result<QueryParams, RelayError> {
        for name in self.required {
            params.require(name)?;
        }
        Ok(self
            .params
            .iter()
            .fold(QueryParams::new(), |query, name| query.param(name, params.get(name))))
    }
}

pub static INFO_ENDPOINTS: &[DingEndpoint] = &[
    DingEndpoint {
        name: "GetErrorCodeDescriptions",
        params: &[],
        required: &[],
    },
    DingEndpoint {
        name: "GetAccountLookup",
        params: &["accountNumber"],
        required: &["accountNumber"],
    },
    DingEndpoint {
        name: "GetPromotionDescriptions",
        params: &["languageCodes"],
        required: &[],
    },
    DingEndpoint {
        name: "GetPromotions",
        params: &["countryIsos", "providerCodes", "accountNumber"],
        required: &[],
    },
    DingEndpoint {
        name: "GetBalance",
        params: &[],
        required: &[],
    },
    DingEndpoint {
        name: "GetProductDescriptions",
        params: &["languageCodes", "skuCodes"],
        required: &[],
    },
    DingEndpoint {
        name: "GetProducts",
        params: &["countryIsos", "providerCodes", "regionCodes"],
        required: &[],
    },
    DingEndpoint {
        name: "GetProviderStatus",
        params: &["providerCodes"],
        required: &[],
    },
    DingEndpoint {
        // accountNumber narrows the providers only when non-empty
        name: "GetProviders",
        params: &["countryIsos", "regionCodes", "accountNumber"],
        required: &[],
    },
    DingEndpoint {
        name: "GetCurrencies",
        params: &[],
        required: &[],
    },
    DingEndpoint {
        name: "GetRegions",
        params: &["countryIsos"],
        required: &[],
    },
    DingEndpoint {
        name: "GetCountries",
        params: &[],
        required: &[],
    },
];

/// Body of `POST /api/V1/SendTransfer`
///
/// Form and query input arrive as strings, so `SendValue` and `ValidateOnly`
/// also accept their string spellings. `ValidateOnly` is only forwarded when
/// the caller set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransferRequest {
    pub sku_code: String,
    #[serde(deserialize_with = "lenient::number")]
    pub send_value: f64,
    pub account_number: String,
    pub distributor_ref: String,
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub validate_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_currency_iso: Option<String>,
    /// Test number used against the UAT environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uat_number: Option<String>,
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub fn routes() -> Router<AppState> {
    let mut router = Router::new();
    for endpoint in INFO_ENDPOINTS {
        let handler = move |state: State<AppState>, params: RelayParams| {
            relay_info(state, params, endpoint)
        };
        router = router.route(&endpoint.route(), get(handler).post(handler));
    }
    router.route("/SendTransfer", post(send_transfer))
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

async fn relay_info(
    State(state): State<AppState>,
    params: RelayParams,
    endpoint: &'static DingEndpoint,
) -> Result<Json<Value>, RelayError> {
    let query = endpoint.query(&params)?;
    let body = state
        .clients
        .ding
        .get(&endpoint.partner_path(), query.pairs())
        .await?;
    Ok(Json(body))
}

async fn send_transfer(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    let transfer: TransferRequest = serde_json::from_value(params.into_value())
        .map_err(|e| RelayError::Payload(format!("invalid transfer: {}", e)))?;

    info!(
        sku_code = %transfer.sku_code,
        distributor_ref = %transfer.distributor_ref,
        validate_only = ?transfer.validate_only,
        "Sending transfer"
    );

    let body = state
        .clients
        .ding
        .post_json("/api/V1/SendTransfer", &transfer)
        .await?;
    Ok(Json(body))
}

/// Deserializers for values that may arrive as strings
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("{} is not a finite number", n))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| D::Error::custom(format!("'{}' is not a number", s))),
            other => Err(D::Error::custom(format!("expected a number, got {}", other))),
        }
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "true" | "1" | "on" => Ok(Some(true)),
                "false" | "0" | "off" => Ok(Some(false)),
                _ => Err(D::Error::custom(format!("'{}' is not a boolean", s))),
            },
            other => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
        }
    }
}
