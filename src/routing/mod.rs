//! # Routing Module
//!
//! Inbound routes of the relay.
//!
//! - `params`: parameter extraction and partner query strings
//! - `tokens`: self token endpoints
//! - `ding`: Ding top-up relay
//! - `amadeus`: Amadeus flight and hotel relay
//! - `router`: assembles everything into one [`axum::Router`]

pub mod amadeus;
pub mod ding;
pub mod params;
pub mod router;
pub mod tokens;
