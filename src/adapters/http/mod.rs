//! HTTP adapters - REST API and gateway callback.

pub mod subscription;

use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use subscription::{
    gateway_callback_router, subscription_api_router, subscription_router, SubscriptionAppState,
};

/// Complete application router.
///
/// Subscription routes run behind request-id, tracing and CORS. Only the
/// JSON API is bounded by `request_timeout`; the gateway callback always
/// finishes with a redirect. `/health` is merged outside the middleware.
pub fn app_router(state: SubscriptionAppState, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    subscription_api_router()
        .layer(TimeoutLayer::new(request_timeout))
        .merge(gateway_callback_router())
        .layer(middleware)
        .route("/health", get(health))
        .with_state(state)
}

/// GET /health - Liveness probe
pub async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
