//! # Relay Parameters Module
//!
//! Inbound parameter extraction and outbound query string construction.
//!
//! The frontend sends partner parameters either as a JSON body, a form body
//! or a query string. [`RelayParams`] merges all three into one JSON object
//! (body fields win over query fields). [`QueryParams`] renders the values the
//! partner expects, leaving absent parameters out of the query entirely.

use crate::error::RelayError;
use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Parameters of an inbound relay request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayParams(pub Map<String, Value>);

impl RelayParams {
    /// Value of `name` if the caller supplied a meaningful one.
    ///
    /// `null`, empty strings and empty arrays count as absent. `false` and `0`
    /// are real values.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| is_present(value))
    }

    /// Like [`RelayParams::get`], failing the relay when the value is absent
    pub fn require(&self, name: &str) -> Result<&Value, RelayError> {
        self.get(name)
            .ok_or_else(|| RelayError::Payload(format!("missing parameter '{}'", name)))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<S> FromRequest<S> for RelayParams
where
    S: Send + Sync,
{
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut params = Map::new();

        if req.uri().query().is_some() {
            let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
                .map_err(|e| RelayError::Payload(e.body_text()))?;
            params.extend(query.into_iter().map(|(k, v)| (k, Value::String(v))));
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| RelayError::Payload(e.body_text()))?;
            params.extend(form.into_iter().map(|(k, v)| (k, Value::String(v))));
        } else if content_type.starts_with("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| RelayError::Payload(e.body_text()))?;
            // An empty JSON body is treated as an empty object
            if !body.is_empty() {
                match serde_json::from_slice::<Value>(&body)
                    .map_err(|e| RelayError::Payload(e.to_string()))?
                {
                    Value::Object(fields) => params.extend(fields),
                    Value::Null => {}
                    _ => {
                        return Err(RelayError::Payload(
                            "request body must be a JSON object".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(RelayParams(params))
    }
}

/// Outbound query string, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` when `value` is present, skip it otherwise
    pub fn param(mut self, name: &str, value: Option<&Value>) -> Self {
        if let Some(rendered) = value.and_then(render) {
            self.0.push((name.to_string(), rendered));
        }
        self
    }

    /// Append `name`, falling back to `default` when `value` is absent
    pub fn param_or(mut self, name: &str, value: Option<&Value>, default: &str) -> Self {
        let rendered = value.and_then(render).unwrap_or_else(|| default.to_string());
        self.0.push((name.to_string(), rendered));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Render a JSON value the way partner query strings expect it.
///
/// Arrays become comma separated lists (`["US","IN"]` -> `US,IN`); absent
/// values render to `None`.
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().filter_map(render).collect();
            if rendered.is_empty() {
                None
            } else {
                Some(rendered.join(","))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
