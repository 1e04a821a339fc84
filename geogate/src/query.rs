//! Geocoding query kinds.
//!
//! The provider takes exactly one lookup parameter per request, named either
//! `address` (forward geocoding) or `latlng` (reverse geocoding).

use std::fmt;

/// Which kind of lookup a query performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Address to coordinates.
    Address,
    /// Coordinates to address.
    LatLng,
}

impl QueryKind {
    /// The provider's query-string parameter name for this kind.
    pub fn param_name(self) -> &'static str {
        match self {
            QueryKind::Address => "address",
            QueryKind::LatLng => "latlng",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}

/// A single lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeQuery {
    /// Lookup kind.
    pub kind: QueryKind,
    /// Raw parameter value, passed to the provider as given.
    pub value: String,
}

impl GeocodeQuery {
    /// Forward lookup of a free-form address.
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Address,
            value: address.into(),
        }
    }

    /// Reverse lookup of a `lat,lng` pair.
    pub fn lat_lng(lat: impl fmt::Display, lng: impl fmt::Display) -> Self {
        Self {
            kind: QueryKind::LatLng,
            value: format!("{},{}", lat, lng),
        }
    }
}
