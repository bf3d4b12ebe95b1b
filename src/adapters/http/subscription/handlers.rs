//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to the subscription command/query
//! handlers. The gateway callback never answers with an error status: every
//! outcome is a 303 to the success or error page.

use std::sync::Arc;

use axum::extract::{Form, Json, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::application::handlers::subscription::{
    CompleteCardRegistrationCommand, CompleteCardRegistrationHandler, GetSubscriptionHandler,
    GetSubscriptionQuery, StartSubscriptionCommand, StartSubscriptionHandler,
};
use crate::domain::foundation::UserId;
use crate::domain::subscription::{PlanCatalog, PlanName, SubscriptionError};
use crate::ports::{MemberStore, PaymentGateway};

use super::dto::{
    CardRegistrationCallback, ErrorResponse, StartSubscriptionRequest, SubscriptionResponse,
};
use super::redirects::SubscriptionRedirects;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for subscription endpoints.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub gateway: Arc<dyn PaymentGateway>,
    pub member_store: Arc<dyn MemberStore>,
    pub plans: PlanCatalog,
    pub redirects: SubscriptionRedirects,
}

impl SubscriptionAppState {
    pub fn start_subscription_handler(&self) -> StartSubscriptionHandler {
        StartSubscriptionHandler::new(self.gateway.clone(), self.member_store.clone())
    }

    pub fn complete_card_registration_handler(&self) -> CompleteCardRegistrationHandler {
        CompleteCardRegistrationHandler::new(
            self.gateway.clone(),
            self.member_store.clone(),
            self.plans.clone(),
        )
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.gateway.clone(), self.member_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user, taken from the `X-User-Id` header set by the
/// session layer in front of this service.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscription - Start a subscription and go to the card page
pub async fn start_subscription(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
    Json(request): Json<StartSubscriptionRequest>,
) -> Result<Redirect, SubscriptionApiError> {
    let plan: PlanName = request.plan.parse().map_err(SubscriptionError::from)?;

    let cmd = StartSubscriptionCommand {
        user_id: user.user_id,
        plan,
        return_url: state.redirects.return_url(),
    };

    let result = state.start_subscription_handler().handle(cmd).await?;
    Ok(Redirect::to(&result.redirect_url))
}

/// GET /api/subscription - Current user's subscription
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    user: AuthenticatedUser,
) -> Result<Json<SubscriptionResponse>, SubscriptionApiError> {
    let query = GetSubscriptionQuery {
        user_id: user.user_id,
    };

    let result = state.get_subscription_handler().handle(query).await?;
    Ok(Json(SubscriptionResponse::from(result)))
}

/// POST /subscription/result - Gateway return after card registration
///
/// A missing or unreadable form body is treated as a missing token.
pub async fn card_registration_result(
    State(state): State<SubscriptionAppState>,
    form: Option<Form<CardRegistrationCallback>>,
) -> Redirect {
    let cmd = CompleteCardRegistrationCommand {
        token: form.and_then(|Form(body)| body.token),
    };

    match state.complete_card_registration_handler().handle(cmd).await {
        Ok(result) => {
            tracing::info!(
                member_uid = %result.member_uid,
                subscription_id = %result.subscription_id,
                replayed = result.replayed,
                "card registration callback completed"
            );
            Redirect::to(&state.redirects.success_url())
        }
        Err(err) => {
            tracing::error!(
                status = %err.status(),
                error = %err,
                "card registration callback redirected to error page"
            );
            Redirect::to(&state.redirects.error_url(&err))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts subscription errors to JSON responses.
#[derive(Debug)]
pub struct SubscriptionApiError(SubscriptionError);

impl From<SubscriptionError> for SubscriptionApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> Response {
        let message = self.0.message();
        let (status, body) = match &self.0 {
            SubscriptionError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "VALIDATION_FAILED",
                    message,
                    serde_json::json!({ "field": field }),
                ),
            ),
            SubscriptionError::Gateway { code, .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "GATEWAY_ERROR",
                    message,
                    serde_json::json!({ "providerCode": code }),
                ),
            ),
            SubscriptionError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("MEMBER_NOT_FOUND", message),
            ),
            SubscriptionError::Persistence(internal) => {
                tracing::error!(error = %internal, "member store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", message),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
