//! Request middleware.
//!
//! Stages are applied in order by [`apply`]. Each stage receives the request
//! and a [`Next`]; it continues the chain by calling `next.run(request)`, or
//! short-circuits by returning a response without calling it.

use axum::{extract::Request, middleware::Next, response::Response, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Target of the per-request access log event.
pub const ACCESS_LOG_TARGET: &str = "geogate_service::access";

/// Log the method and URI of every request, then hand it on unchanged.
pub async fn access_log(request: Request, next: Next) -> Response {
    tracing::info!(
        target: ACCESS_LOG_TARGET,
        method = %request.method(),
        uri = %request.uri(),
        "request"
    );

    next.run(request).await
}

/// Wrap a router in the middleware chain.
///
/// The first layer listed is the outermost. `TraceLayer` only opens the
/// request span; its own request event is disabled so [`access_log`] stays
/// the single log line per request.
pub fn apply(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http().on_request(()))
            .layer(axum::middleware::from_fn(access_log)),
    )
}
