//! HTTP adapter for subscription endpoints.
//!
//! - `GET /api/subscription` - Current user's subscription
//! - `POST /api/subscription` - Start a subscription
//! - `POST /subscription/result` - Gateway return after card registration

pub mod dto;
pub mod handlers;
mod redirects;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedUser, SubscriptionApiError, SubscriptionAppState};
pub use redirects::SubscriptionRedirects;
pub use routes::{gateway_callback_router, subscription_api_router, subscription_router};
