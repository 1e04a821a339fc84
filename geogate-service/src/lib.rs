//! Geogate Service Library
//!
//! Route table, middleware, HTTP server and lifecycle controller for the
//! geocoding gateway. Used by the geogate-service binary and the integration
//! tests.

pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod server;

use std::sync::Arc;

use axum::{routing::any, Router};
use geogate::Geocoder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Geocoding collaborator.
    pub geocoder: Geocoder,
}

/// OpenAPI documentation for the gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geogate",
        version = "0.1.0",
        description = "HTTP gateway for address and coordinate geocoding lookups.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(handlers::home, handlers::geocode, handlers::geoloc),
    components(schemas(
        handlers::ErrorResponse,
        geogate::GeocodeResult,
        geogate::Geometry,
        geogate::Location,
    )),
    tags(
        (name = "geocoding", description = "Geocoding endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// The route table. Routes answer every HTTP method.
///
/// `/geoloc/:coords` captures the whole `lat,lng` segment; the handler splits
/// it and answers 404 when it is not a pair.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(handlers::home))
        .route("/geocode/:address", any(handlers::geocode))
        .route("/geoloc/:coords", any(handlers::geoloc))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Route table plus API docs, wrapped in the middleware chain.
pub fn app(state: Arc<AppState>) -> Router {
    let router = routes(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    middleware::apply(router)
}

// Re-export commonly used types for convenience
pub use config::{ServerConfig, ServiceConfig, Timeouts};
pub use handlers::{ErrorResponse, LatLngParam};
pub use lifecycle::{shutdown_signal, LifecycleController, LifecycleState};
pub use server::{Server, ServerError, ShutdownRequest};
