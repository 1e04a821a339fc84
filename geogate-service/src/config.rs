//! Service configuration.
//!
//! Built once at startup and passed by value into the server; nothing reads
//! the environment after that.

use std::time::Duration;

use geogate::GeocoderBuilder;

/// Default listen address, all interfaces on port 5000.
pub const DEFAULT_BIND_ADDRESS: &str = ":5000";

/// Time allowed to receive a request's headers.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);
/// Time allowed to produce a response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
/// Keep-alive connections with nothing in flight are closed after this.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// Window in which in-flight requests may finish after a termination signal.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection and shutdown timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Duration,
    pub write: Duration,
    pub idle: Duration,
    pub shutdown: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: READ_TIMEOUT,
            write: WRITE_TIMEOUT,
            idle: IDLE_TIMEOUT,
            shutdown: SHUTDOWN_TIMEOUT,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address as configured, e.g. `:5000` or `127.0.0.1:8080`.
    pub bind_address: String,
    /// Fixed timeouts; not read from the environment.
    pub timeouts: Timeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ServerConfig {
    /// Server settings listening on `bind_address` with the standard timeouts.
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
            timeouts: Timeouts::default(),
        }
    }

    /// Address in a form the socket layer accepts.
    ///
    /// A bare `:port` means every interface.
    pub fn listen_address(&self) -> String {
        let trimmed = self.bind_address.trim();
        if trimmed.starts_with(':') {
            format!("0.0.0.0{}", trimmed)
        } else {
            trimmed.to_string()
        }
    }
}

/// Everything the service binary needs at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub geocoder: GeocoderBuilder,
}

impl ServiceConfig {
    /// Read `BIND_ADDRESS` plus the geocoder variables
    /// (see [`GeocoderBuilder::from_env`]).
    pub fn from_env() -> geogate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> geogate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into());

        Ok(Self {
            server: ServerConfig::new(bind_address),
            geocoder: GeocoderBuilder::from_lookup(lookup)?,
        })
    }
}
