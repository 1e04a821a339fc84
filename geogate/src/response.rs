//! Provider payload types.
//!
//! Only the fields the gateway re-serializes are modelled; everything else in
//! the provider's JSON (address components, viewport, place id) is ignored on
//! decode.

use serde::{Deserialize, Serialize};

use crate::error::{GeocodeError, Result};

/// Top-level provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    /// Matches, best first.
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    /// Provider status string (`OK`, `ZERO_RESULTS`, `REQUEST_DENIED`, ...).
    #[serde(default)]
    pub status: String,
}

/// A single geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeocodeResult {
    /// Location of the match.
    pub geometry: Geometry,
    /// Human-readable address of the match.
    #[serde(rename = "formatted_address")]
    pub address: String,
}

/// Geometry of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Geometry {
    /// Point coordinates.
    pub location: Location,
    /// Precision of the location (`ROOFTOP`, `APPROXIMATE`, ...).
    pub location_type: String,
}

/// WGS84 coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Location {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Provider statuses that still count as a successful call.
const SUCCESS_STATUSES: [&str; 2] = ["OK", "ZERO_RESULTS"];

impl GeocodeResponse {
    /// Parse a raw provider payload.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Take the best match.
    ///
    /// An empty result list is [`GeocodeError::NoResults`] unless the provider
    /// reported a failure status, in which case it is
    /// [`GeocodeError::ProviderRejected`].
    pub fn into_first(self) -> Result<GeocodeResult> {
        match self.results.into_iter().next() {
            Some(result) => Ok(result),
            None if self.status.is_empty() || SUCCESS_STATUSES.contains(&self.status.as_str()) => {
                Err(GeocodeError::NoResults)
            }
            None => Err(GeocodeError::ProviderRejected {
                status: self.status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "results": [
            {
                "formatted_address": "Los Angeles, CA, USA",
                "geometry": {
                    "location": {"lat": 34.0522342, "lng": -118.2436849},
                    "location_type": "APPROXIMATE",
                    "viewport": {}
                },
                "place_id": "abc"
            },
            {
                "formatted_address": "Los Angeles County, CA, USA",
                "geometry": {
                    "location": {"lat": 34.3, "lng": -118.2},
                    "location_type": "APPROXIMATE"
                }
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let response = GeocodeResponse::from_slice(PAYLOAD.as_bytes()).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.status, "OK");
        assert_eq!(response.results[0].geometry.location.lat, 34.0522342);
    }

    #[test]
    fn test_into_first_takes_first_match() {
        let response = GeocodeResponse::from_slice(PAYLOAD.as_bytes()).unwrap();
        let first = response.into_first().unwrap();
        assert_eq!(first.address, "Los Angeles, CA, USA");
        assert_eq!(first.geometry.location_type, "APPROXIMATE");
    }

    #[test]
    fn test_result_serializes_with_provider_field_names() {
        let response = GeocodeResponse::from_slice(PAYLOAD.as_bytes()).unwrap();
        let json = serde_json::to_value(response.into_first().unwrap()).unwrap();
        assert_eq!(json["formatted_address"], "Los Angeles, CA, USA");
        assert_eq!(json["geometry"]["location"]["lng"], -118.2436849);
        assert!(json.get("address").is_none());
        assert!(json.get("place_id").is_none());
    }

    #[test]
    fn test_empty_results_is_no_results() {
        let response =
            GeocodeResponse::from_slice(br#"{"results": [], "status": "ZERO_RESULTS"}"#).unwrap();
        assert!(matches!(response.into_first(), Err(GeocodeError::NoResults)));
    }

    #[test]
    fn test_empty_results_with_failure_status_is_rejected() {
        let response =
            GeocodeResponse::from_slice(br#"{"results": [], "status": "REQUEST_DENIED"}"#)
                .unwrap();
        match response.into_first() {
            Err(GeocodeError::ProviderRejected { status }) => assert_eq!(status, "REQUEST_DENIED"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload() {
        let err = GeocodeResponse::from_slice(b"<html>").unwrap_err();
        assert!(matches!(err, GeocodeError::Decode(_)));
    }
}
