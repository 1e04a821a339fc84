//! # geogate - Geocoding collaborator
//!
//! Types and backends for forward (address → coordinates) and reverse
//! (coordinates → address) geocoding lookups against the Google Geocoding
//! API, or against a local fixture file for offline use.
//!
//! ## Quick Start
//!
//! ```ignore
//! use geogate::{GeocodeQuery, Geocoder};
//!
//! let geocoder = Geocoder::fixture("data/LA.json");
//! let best = geocoder.first_match(&GeocodeQuery::address("Los Angeles")).await?;
//! assert_eq!(best.address, "Los Angeles, CA, USA");
//! ```
//!
//! ## Provider Payload
//!
//! ```text
//! { "results": [ { "geometry": { "location": {"lat": f64, "lng": f64},
//!                                "location_type": string },
//!                  "formatted_address": string } ],
//!   "status": string }
//! ```
//!
//! An empty `results` list is reported as [`GeocodeError::NoResults`], never
//! as a panic.

pub mod error;
pub mod provider;
pub mod query;
pub mod response;
pub mod service;

// Re-export main types at crate root for convenience
pub use error::{GeocodeError, Result};
pub use provider::{FixtureProvider, GoogleProvider, Provider};
pub use query::{GeocodeQuery, QueryKind};
pub use response::{GeocodeResponse, GeocodeResult, Geometry, Location};
pub use service::{Geocoder, GeocoderBuilder, Mode};
