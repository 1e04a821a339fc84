//! Error types for the geogate library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when performing a geocoding lookup.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// The fixture file backing mock mode could not be read.
    #[error("Failed to read fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request to the provider failed (connect, timeout, body read).
    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success HTTP status.
    #[error("Provider returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    /// The provider payload was not valid geocoding JSON.
    #[error("Malformed provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The provider refused the query (e.g. `REQUEST_DENIED`, `OVER_QUERY_LIMIT`).
    #[error("Provider rejected the query with status {status}")]
    ProviderRejected { status: String },

    /// The lookup succeeded but matched nothing.
    #[error("No geocoding results")]
    NoResults,

    /// A configuration value could not be understood.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias using [`GeocodeError`].
pub type Result<T> = std::result::Result<T, GeocodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeocodeError::UpstreamStatus { status: 503 };
        assert!(err.to_string().contains("503"));

        let err = GeocodeError::ProviderRejected {
            status: "REQUEST_DENIED".to_string(),
        };
        assert!(err.to_string().contains("REQUEST_DENIED"));

        let err = GeocodeError::Fixture {
            path: PathBuf::from("data/LA.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("data/LA.json"));
    }
}
