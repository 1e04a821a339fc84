//! Geogate Service - HTTP gateway for geocoding lookups.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BIND_ADDRESS` | Listen address (`:port` means all interfaces) | `:5000` |
//! | `GOOGLE_API_KEY` | Geocoding API key | empty |
//! | `GEOCODE_MODE` | `mock` (fixture) or `live` (provider) | `mock` |
//! | `GEOCODE_FIXTURE` | Fixture file for mock mode | `data/LA.json` |
//! | `GEOCODE_BASE_URL` | Provider endpoint | Google Geocoding API |
//! | `GEOCODE_TIMEOUT_SECS` | Provider request timeout | 10 |
//! | `RUST_LOG` | Log filter | `geogate_service=info,geogate=info,tower_http=info` |
//!
//! ## Endpoints
//!
//! - `GET /` - Liveness message
//! - `GET /geocode/{address}` - Best geocoding match for an address
//! - `GET /geoloc/{lat},{lng}` - Echo of the coordinate pair
//! - `GET /docs` - OpenAPI documentation (Swagger UI)
//!
//! The process runs until SIGINT or SIGTERM, then drains for up to 30 seconds.

use std::sync::Arc;

use geogate_service::{app, AppState, LifecycleController, ServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geogate_service=info,geogate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    let geocoder = config.geocoder.build()?;

    tracing::info!(
        bind_address = %config.server.bind_address,
        mode = %geocoder.mode(),
        read_timeout_secs = config.server.timeouts.read.as_secs(),
        write_timeout_secs = config.server.timeouts.write.as_secs(),
        idle_timeout_secs = config.server.timeouts.idle.as_secs(),
        "Starting geogate service"
    );

    let state = Arc::new(AppState { geocoder });
    let controller = LifecycleController::new(config.server, app(state));

    controller.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
