//! Data Transfer Objects for subscription HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::subscription::GetSubscriptionResult;
use crate::domain::subscription::ActivationState;
use crate::ports::GatewaySubscription;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSubscriptionRequest {
    /// Literal plan name, e.g. `"Plan Anual"`.
    pub plan: String,
}

/// Form body the gateway POSTs to the return URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardRegistrationCallback {
    pub token: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription view for the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub state: ActivationState,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewaySubscriptionResponse>,
}

impl From<GetSubscriptionResult> for SubscriptionResponse {
    fn from(result: GetSubscriptionResult) -> Self {
        Self {
            state: result.state,
            active: result.state.is_active(),
            plan_name: result.plan_name.map(|p| p.as_str().to_string()),
            customer_id: result.customer_id,
            subscription_id: result.subscription_id,
            subscription_status: result.subscription_status.map(|s| s.as_str().to_string()),
            created_at: result.created_at.map(|t| t.to_iso_string()),
            activated_at: result.activated_at.map(|t| t.to_iso_string()),
            gateway: result.gateway.map(GatewaySubscriptionResponse::from),
        }
    }
}

/// Gateway-side subscription details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySubscriptionResponse {
    pub subscription_id: String,
    pub plan_id: Option<String>,
    pub status: Option<i64>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub next_invoice_date: Option<String>,
}

impl From<GatewaySubscription> for GatewaySubscriptionResponse {
    fn from(sub: GatewaySubscription) -> Self {
        Self {
            subscription_id: sub.subscription_id,
            plan_id: sub.plan_id,
            status: sub.status,
            period_start: sub.period_start,
            period_end: sub.period_end,
            next_invoice_date: sub.next_invoice_date,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
