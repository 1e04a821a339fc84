//! HTTP request handlers for the geocoding gateway.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use geogate::{GeocodeError, GeocodeQuery};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Body of the liveness endpoint.
pub const LIVENESS_MESSAGE: &str = "Server is up and running!\n";

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// A `lat,lng` path segment split into its two halves.
///
/// The split happens at the last comma and both halves must be non-empty.
/// Values are kept verbatim; nothing checks that they are numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatLngParam {
    pub lat: String,
    pub lng: String,
}

impl LatLngParam {
    /// Split a raw path segment, or `None` if it is not a `lat,lng` pair.
    pub fn parse(segment: &str) -> Option<Self> {
        let (lat, lng) = segment.rsplit_once(',')?;
        if lat.is_empty() || lng.is_empty() {
            return None;
        }
        Some(Self {
            lat: lat.to_string(),
            lng: lng.to_string(),
        })
    }
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service is running", body = String,
            content_type = "text/plain")
    )
)]
pub async fn home() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_MESSAGE)
}

/// Geocode an address and return the best match.
///
/// # Returns
///
/// - `200 OK` with the first provider result
/// - `404 Not Found` if the provider matched nothing
/// - `502 Bad Gateway` if the provider call failed or returned garbage
/// - `500 Internal Server Error` if the mock fixture cannot be read
#[utoipa::path(
    get,
    path = "/geocode/{address}",
    tag = "geocoding",
    params(("address" = String, Path, description = "Free-form address to look up")),
    responses(
        (status = 200, description = "Best match", body = geogate::GeocodeResult),
        (status = 404, description = "No match", body = ErrorResponse),
        (status = 500, description = "Fixture unavailable", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    let query = GeocodeQuery::address(address);

    match state.geocoder.first_match(&query).await {
        Ok(result) => {
            tracing::info!(
                address = %query.value,
                formatted_address = %result.address,
                lat = result.geometry.location.lat,
                lng = result.geometry.location.lng,
                "Geocode match"
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => error_response(&query, e),
    }
}

/// Echo a `lat,lng` path segment.
#[utoipa::path(
    get,
    path = "/geoloc/{lat},{lng}",
    tag = "geocoding",
    params(
        ("lat" = String, Path, description = "Latitude, echoed verbatim"),
        ("lng" = String, Path, description = "Longitude, echoed verbatim")
    ),
    responses(
        (status = 200, description = "Parsed coordinates", body = String,
            content_type = "text/plain"),
        (status = 404, description = "Segment is not a lat,lng pair", body = ErrorResponse)
    )
)]
pub async fn geoloc(Path(segment): Path<String>, uri: Uri) -> Response {
    match LatLngParam::parse(&segment) {
        Some(LatLngParam { lat, lng }) => {
            (StatusCode::OK, format!("lat: {}, lng: {}\n", lat, lng)).into_response()
        }
        None => not_found(uri).await.into_response(),
    }
}

/// Fallback for paths no route matches.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No route for {}", uri.path()),
        }),
    )
}

/// Map a lookup failure to a status code.
fn error_response(query: &GeocodeQuery, e: GeocodeError) -> Response {
    let status = match &e {
        GeocodeError::NoResults => StatusCode::NOT_FOUND,
        GeocodeError::Request(_)
        | GeocodeError::UpstreamStatus { .. }
        | GeocodeError::Decode(_)
        | GeocodeError::ProviderRejected { .. } => StatusCode::BAD_GATEWAY,
        GeocodeError::Fixture { .. } | GeocodeError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    tracing::warn!(
        kind = %query.kind,
        value = %query.value,
        status = status.as_u16(),
        error = %e,
        "Geocode lookup failed"
    );

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_param_parse() {
        let param = LatLngParam::parse("34.05,-118.24").unwrap();
        assert_eq!(param.lat, "34.05");
        assert_eq!(param.lng, "-118.24");
    }

    #[test]
    fn test_lat_lng_param_splits_on_last_comma() {
        let param = LatLngParam::parse("1,2,3").unwrap();
        assert_eq!(param.lat, "1,2");
        assert_eq!(param.lng, "3");
    }

    #[test]
    fn test_lat_lng_param_rejects_incomplete() {
        assert!(LatLngParam::parse("34.05").is_none());
        assert!(LatLngParam::parse(",-118.24").is_none());
        assert!(LatLngParam::parse("34.05,").is_none());
    }

    #[test]
    fn test_lat_lng_param_keeps_non_numeric_values() {
        let param = LatLngParam::parse("north,west").unwrap();
        assert_eq!(param.lat, "north");
        assert_eq!(param.lng, "west");
    }

    #[test]
    fn test_error_response_serialize() {
        let response = ErrorResponse {
            error: "No geocoding results".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("No geocoding results"));
    }
}
