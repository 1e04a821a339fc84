//! Backends that answer geocoding queries.
//!
//! Two backends exist: a local fixture file (mock mode) and the Google
//! Geocoding JSON API (live mode). Both return the raw provider payload
//! decoded into a [`GeocodeResponse`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;

use crate::error::{GeocodeError, Result};
use crate::query::GeocodeQuery;
use crate::response::GeocodeResponse;

/// Google Geocoding API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Default upstream request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Reads a canned provider payload from disk on every lookup.
///
/// The query is ignored: every lookup yields the same payload.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    path: PathBuf,
}

impl FixtureProvider {
    /// Create a provider backed by the given JSON file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the fixture file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the fixture.
    pub async fn lookup(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        tracing::debug!(
            kind = %query.kind,
            value = %query.value,
            fixture = %self.path.display(),
            "Serving lookup from fixture"
        );

        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| GeocodeError::Fixture {
                path: self.path.clone(),
                source,
            })?;

        GeocodeResponse::from_slice(&raw)
    }
}

/// Calls the Google Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleProvider {
    /// Create a provider for the given endpoint and API key.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Endpoint the provider calls.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform `GET {base_url}?{kind}={value}&key={api_key}`.
    pub async fn lookup(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        // Never log the API key.
        tracing::info!(
            url = %self.base_url,
            kind = %query.kind,
            value = %query.value,
            "Calling geocoding provider"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                (query.kind.param_name(), query.value.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let raw = response.bytes().await?;
        GeocodeResponse::from_slice(&raw)
    }
}

/// The backend a [`Geocoder`](crate::Geocoder) dispatches to.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Local fixture file.
    Fixture(FixtureProvider),
    /// Google Geocoding API.
    Google(GoogleProvider),
}

impl Provider {
    /// Run a lookup against whichever backend is configured.
    pub async fn lookup(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        match self {
            Provider::Fixture(fixture) => fixture.lookup(query).await,
            Provider::Google(google) => google.lookup(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_fixture(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_fixture_ignores_query() {
        let file = write_fixture(
            r#"{"results": [{"formatted_address": "Somewhere",
                "geometry": {"location": {"lat": 1.5, "lng": 2.5}, "location_type": "ROOFTOP"}}],
                "status": "OK"}"#,
        );
        let provider = FixtureProvider::new(file.path());

        let a = provider
            .lookup(&GeocodeQuery::address("anything"))
            .await
            .unwrap();
        let b = provider
            .lookup(&GeocodeQuery::address("other"))
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.results[0].address, "Somewhere");
    }

    #[tokio::test]
    async fn test_fixture_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FixtureProvider::new(dir.path().join("missing.json"));

        let err = provider
            .lookup(&GeocodeQuery::address("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Fixture { .. }));
    }

    #[tokio::test]
    async fn test_fixture_malformed_json() {
        let file = write_fixture("not json");
        let provider = FixtureProvider::new(file.path());

        let err = provider
            .lookup(&GeocodeQuery::address("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_google_unreachable_endpoint() {
        // Port 9 (discard) on loopback is expected to refuse connections.
        let provider =
            GoogleProvider::new("http://127.0.0.1:9/json", "key", Duration::from_secs(2)).unwrap();

        let err = provider
            .lookup(&GeocodeQuery::address("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Request(_)));
    }
}
