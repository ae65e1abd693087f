//! # Amadeus Routes
//!
//! Relays the Amadeus self-service flight and hotel APIs.
//!
//! Searches go through the GET client (`X-HTTP-Method-Override: GET`), with
//! the inbound body translated into a partner query string. Pricing and
//! booking go through the POST client with a JSON body wrapping the offer the
//! frontend selected.
//!
//! ## Routes
//!
//! - `POST /shopping/flight-offers` -> `GET /v2/shopping/flight-offers`
//! - `POST /shopping/flight-offers/pricing` -> `POST /v1/shopping/flight-offers/pricing`
//! - `POST /booking/flight-orders` -> `POST /v1/booking/flight-orders`
//! - `POST /reference-data/airlines` -> `GET /v1/reference-data/airlines`
//! - `POST /hotels/by-city` -> `GET /v1/reference-data/locations/hotels/by-city`
//! - `POST /hotels/by-geocode` -> `GET /v1/reference-data/locations/hotels/by-geocode`
//! - `POST /hotel-offers` -> `GET /v3/shopping/hotel-offers`

use super::params::{QueryParams, RelayParams};
use crate::AppState;
use crate::error::RelayError;
use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Map, Value, json};
use tracing::info;

pub const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";
pub const FLIGHT_PRICING_PATH: &str = "/v1/shopping/flight-offers/pricing?forceClass=false";
pub const FLIGHT_ORDERS_PATH: &str = "/v1/booking/flight-orders";
pub const AIRLINES_PATH: &str = "/v1/reference-data/airlines";
pub const HOTELS_BY_CITY_PATH: &str = "/v1/reference-data/locations/hotels/by-city";
pub const HOTELS_BY_GEOCODE_PATH: &str = "/v1/reference-data/locations/hotels/by-geocode";
pub const HOTEL_OFFERS_PATH: &str = "/v3/shopping/hotel-offers";

/// Booking sections relayed as sent by the frontend
const ORDER_SECTIONS: [&str; 3] = ["remarks", "ticketingAgreement", "contacts"];

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shopping/flight-offers", post(flight_offers))
        .route("/shopping/flight-offers/pricing", post(flight_offers_pricing))
        .route("/booking/flight-orders", post(flight_orders))
        .route("/reference-data/airlines", post(airlines))
        .route("/hotels/by-city", post(hotels_by_city))
        .route("/hotels/by-geocode", post(hotels_by_geocode))
        .route("/hotel-offers", post(hotel_offers))
}

/// Flight offers search query.
///
/// A round trip is searched only when `returnDate` is present; otherwise the
/// parameter is left out entirely. Passenger counts for children and infants
/// default to `0`.
pub fn flight_offers_query(params: &RelayParams) -> Result<QueryParams, RelayError> {
    Ok(QueryParams::new()
        .param("originLocationCode", Some(params.require("originLocationCode")?))
        .param("destinationLocationCode", Some(params.require("destinationLocationCode")?))
        .param("departureDate", Some(params.require("departureDate")?))
        .param("returnDate", params.get("returnDate"))
        .param("adults", Some(params.require("adults")?))
        .param_or("children", params.get("children"), "0")
        .param_or("infants", params.get("infants"), "0")
        .param("travelClass", params.get("travelClass"))
        .param("includedAirlineCodes", params.get("includedAirlineCodes"))
        .param("excludedAirlineCodes", params.get("excludedAirlineCodes"))
        .param("nonStop", params.get("nonStop"))
        .param("currencyCode", params.get("currencyCode"))
        .param("maxPrice", params.get("maxPrice"))
        .param("max", params.get("max")))
}

/// Body of a flight offers pricing request for the offer the frontend picked
pub fn pricing_payload(params: &RelayParams) -> Result<Value, RelayError> {
    let offer = params.require("flightOfferData")?;
    Ok(json!({
        "data": {
            "type": "flight-offers-pricing",
            "flightOffers": [offer],
        }
    }))
}

/// Body of a flight order for a priced offer and its travelers
pub fn order_payload(params: &RelayParams) -> Result<Value, RelayError> {
    let offer = params.require("flightOfferPriceData")?;

    let mut data = Map::new();
    data.insert("type".to_string(), json!("flight-order"));
    data.insert("flightOffers".to_string(), json!([offer]));
    data.insert(
        "travelers".to_string(),
        params.get("travelers").cloned().unwrap_or_else(|| json!([])),
    );
    for section in ORDER_SECTIONS {
        if let Some(value) = params.get(section) {
            data.insert(section.to_string(), value.clone());
        }
    }

    Ok(json!({ "data": data }))
}

pub fn airlines_query(params: &RelayParams) -> Result<QueryParams, RelayError> {
    Ok(QueryParams::new().param("airlineCodes", Some(params.require("airlineCodes")?)))
}

/// Hotel list by IATA city code; `amenities` and `ratings` only when present
pub fn hotels_by_city_query(params: &RelayParams) -> Result<QueryParams, RelayError> {
    let query = QueryParams::new().param("cityCode", Some(params.require("cityCode")?));
    Ok(hotel_filters(query, params))
}

/// Hotel list around a coordinate; `amenities` and `ratings` only when present
pub fn hotels_by_geocode_query(params: &RelayParams) -> Result<QueryParams, RelayError> {
    let query = QueryParams::new()
        .param("latitude", Some(params.require("latitude")?))
        .param("longitude", Some(params.require("longitude")?));
    Ok(hotel_filters(query, params))
}

pub fn hotel_offers_query(params: &RelayParams) -> Result<QueryParams, RelayError> {
    Ok(QueryParams::new()
        .param("hotelIds", Some(params.require("hotelIds")?))
        .param("adults", params.get("adults"))
        .param("checkInDate", params.get("checkInDate"))
        .param("checkOutDate", params.get("checkOutDate"))
        .param("roomQuantity", params.get("roomQuantity"))
        .param("priceRange", params.get("priceRange"))
        .param("currency", params.get("currency"))
        .param("boardType", params.get("boardType"))
        .param("bestRateOnly", params.get("bestRateOnly")))
}

///////////////////////////////////////////////////////////////////////////////
//****                       Private Functions                           ****//
///////////////////////////////////////////////////////////////////////////////

fn hotel_filters(query: QueryParams, params: &RelayParams) -> QueryParams {
    query
        .param("radius", params.get("radius"))
        .param("radiusUnit", params.get("radiusUnit"))
        .param("amenities", params.get("amenities"))
        .param("ratings", params.get("ratings"))
        .param("hotelSource", params.get("hotelSource"))
}

async fn search(state: &AppState, path: &str, query: QueryParams) -> Result<Json<Value>, RelayError> {
    let body = state.clients.amadeus.get(path, query.pairs()).await?;
    Ok(Json(body))
}

async fn flight_offers(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    let query = flight_offers_query(&params)?;
    info!(round_trip = query.contains("returnDate"), "Searching flight offers");
    search(&state, FLIGHT_OFFERS_PATH, query).await
}

async fn flight_offers_pricing(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    let payload = pricing_payload(&params)?;
    let body = state
        .clients
        .amadeus_post
        .post_json(FLIGHT_PRICING_PATH, &payload)
        .await?;
    Ok(Json(body))
}

async fn flight_orders(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    let payload = order_payload(&params)?;
    let body = state
        .clients
        .amadeus_post
        .post_json(FLIGHT_ORDERS_PATH, &payload)
        .await?;
    Ok(Json(body))
}

async fn airlines(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    search(&state, AIRLINES_PATH, airlines_query(&params)?).await
}

async fn hotels_by_city(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    search(&state, HOTELS_BY_CITY_PATH, hotels_by_city_query(&params)?).await
}

async fn hotels_by_geocode(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    search(&state, HOTELS_BY_GEOCODE_PATH, hotels_by_geocode_query(&params)?).await
}

async fn hotel_offers(
    State(state): State<AppState>,
    params: RelayParams,
) -> Result<Json<Value>, RelayError> {
    search(&state, HOTEL_OFFERS_PATH, hotel_offers_query(&params)?).await
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
