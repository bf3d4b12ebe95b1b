//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    card_registration_result, get_subscription, start_subscription, SubscriptionAppState,
};

/// Create the subscription router.
///
/// # Routes
///
/// ## User Endpoints (require `X-User-Id`)
/// - `GET /api/subscription` - Current user's subscription
/// - `POST /api/subscription` - Start a subscription, 303 to the card page
///
/// ## Gateway Callback (no auth)
/// - `POST /subscription/result` - Card registration return, always 303
pub fn subscription_router() -> Router<SubscriptionAppState> {
    subscription_api_router().merge(gateway_callback_router())
}

/// User-facing JSON endpoints under `/api/subscription`.
pub fn subscription_api_router() -> Router<SubscriptionAppState> {
    Router::new().route("/api/subscription", get(get_subscription).post(start_subscription))
}

/// Gateway return route.
///
/// Must not run under a request timeout: a dropped handler would answer
/// without a redirect, or stop between subscription creation and the
/// member update. Gateway calls are bounded by the HTTP client instead.
pub fn gateway_callback_router() -> Router<SubscriptionAppState> {
    Router::new().route("/subscription/result", post(card_registration_result))
}
