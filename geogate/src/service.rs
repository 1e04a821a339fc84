//! High-level geocoding entry point.
//!
//! [`Geocoder`] hides the provider choice behind two calls: [`Geocoder::lookup`]
//! returns the whole provider payload, [`Geocoder::first_match`] returns just
//! the best result or a typed error when there is none.
//!
//! ```ignore
//! use geogate::{GeocodeQuery, GeocoderBuilder};
//!
//! let geocoder = GeocoderBuilder::from_env()?.build()?;
//! let best = geocoder.first_match(&GeocodeQuery::address("Los Angeles")).await?;
//! println!("{} ({}, {})", best.address, best.geometry.location.lat, best.geometry.location.lng);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{GeocodeError, Result};
use crate::provider::{
    FixtureProvider, GoogleProvider, Provider, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
use crate::query::GeocodeQuery;
use crate::response::{GeocodeResponse, GeocodeResult};

/// Default fixture path for mock mode, relative to the working directory.
pub const DEFAULT_FIXTURE_PATH: &str = "data/LA.json";

/// Whether lookups hit the real provider or a local fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Serve every lookup from the fixture file.
    #[default]
    Mock,
    /// Call the provider with the query.
    Live,
}

impl FromStr for Mode {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mock" | "fixture" => Ok(Mode::Mock),
            "live" | "google" => Ok(Mode::Live),
            other => Err(GeocodeError::Config(format!(
                "unknown geocode mode '{}', expected 'mock' or 'live'",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Mock => f.write_str("mock"),
            Mode::Live => f.write_str("live"),
        }
    }
}

/// Geocoding front end over a [`Provider`].
#[derive(Debug, Clone)]
pub struct Geocoder {
    provider: Provider,
    mode: Mode,
}

impl Geocoder {
    /// Geocoder serving every lookup from a fixture file.
    pub fn fixture(path: impl Into<PathBuf>) -> Self {
        Self {
            provider: Provider::Fixture(FixtureProvider::new(path)),
            mode: Mode::Mock,
        }
    }

    /// Configured mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Underlying provider.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Run a lookup and return the full provider payload.
    pub async fn lookup(&self, query: &GeocodeQuery) -> Result<GeocodeResponse> {
        self.provider.lookup(query).await
    }

    /// Run a lookup and return only the best match.
    pub async fn first_match(&self, query: &GeocodeQuery) -> Result<GeocodeResult> {
        self.lookup(query).await?.into_first()
    }
}

/// Builder for [`Geocoder`].
#[derive(Debug, Clone)]
pub struct GeocoderBuilder {
    mode: Mode,
    api_key: String,
    base_url: String,
    fixture_path: PathBuf,
    timeout: Duration,
}

impl Default for GeocoderBuilder {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            fixture_path: PathBuf::from(DEFAULT_FIXTURE_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeocoderBuilder {
    /// Builder with defaults: mock mode, `data/LA.json`, empty API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GOOGLE_API_KEY` | empty |
    /// | `GEOCODE_MODE` | `mock` |
    /// | `GEOCODE_FIXTURE` | `data/LA.json` |
    /// | `GEOCODE_BASE_URL` | Google Geocoding endpoint |
    /// | `GEOCODE_TIMEOUT_SECS` | 10 |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(mode) = lookup("GEOCODE_MODE") {
            builder.mode = mode.parse()?;
        }
        if let Some(api_key) = lookup("GOOGLE_API_KEY") {
            builder.api_key = api_key;
        }
        if let Some(base_url) = lookup("GEOCODE_BASE_URL") {
            builder.base_url = base_url;
        }
        if let Some(path) = lookup("GEOCODE_FIXTURE") {
            builder.fixture_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("GEOCODE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                GeocodeError::Config(format!("GEOCODE_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            builder.timeout = Duration::from_secs(secs);
        }

        Ok(builder)
    }

    /// Select mock or live mode.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the provider API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Override the provider endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the fixture file used in mock mode.
    pub fn fixture_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture_path = path.into();
        self
    }

    /// Set the upstream request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the geocoder.
    pub fn build(self) -> Result<Geocoder> {
        let provider = match self.mode {
            Mode::Mock => Provider::Fixture(FixtureProvider::new(self.fixture_path)),
            Mode::Live => {
                if self.api_key.is_empty() {
                    tracing::warn!("GOOGLE_API_KEY is empty, provider calls will be rejected");
                }
                Provider::Google(GoogleProvider::new(
                    self.base_url,
                    self.api_key,
                    self.timeout,
                )?)
            }
        };

        Ok(Geocoder {
            provider,
            mode: self.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("mock".parse::<Mode>().unwrap(), Mode::Mock);
        assert_eq!("LIVE".parse::<Mode>().unwrap(), Mode::Live);
        assert!("sometimes".parse::<Mode>().is_err());
    }

    #[test]
    fn test_defaults_are_mock_mode() {
        let geocoder = GeocoderBuilder::from_lookup(env(&[])).unwrap().build().unwrap();
        assert_eq!(geocoder.mode(), Mode::Mock);
        match geocoder.provider() {
            Provider::Fixture(fixture) => {
                assert_eq!(fixture.path(), std::path::Path::new(DEFAULT_FIXTURE_PATH))
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_live_mode_from_env() {
        let geocoder = GeocoderBuilder::from_lookup(env(&[
            ("GEOCODE_MODE", "live"),
            ("GOOGLE_API_KEY", "secret"),
            ("GEOCODE_BASE_URL", "http://127.0.0.1:1/json"),
            ("GEOCODE_TIMEOUT_SECS", "3"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(geocoder.mode(), Mode::Live);
        match geocoder.provider() {
            Provider::Google(google) => assert_eq!(google.base_url(), "http://127.0.0.1:1/json"),
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_timeout() {
        let err = GeocoderBuilder::from_lookup(env(&[("GEOCODE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Config(_)));
    }

    #[tokio::test]
    async fn test_first_match_from_repository_fixture() {
        let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/LA.json");
        let geocoder = Geocoder::fixture(fixture);

        let best = geocoder
            .first_match(&GeocodeQuery::address("ignored"))
            .await
            .unwrap();
        assert_eq!(best.address, "Los Angeles, CA, USA");
        assert_eq!(best.geometry.location.lat, 34.0522342);
    }
}
