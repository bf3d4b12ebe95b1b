//! Payment gateway port.
//!
//! Contract for the HMAC-signed subscription gateway. Implementations sign
//! every request, send it, and convert the response into a typed value or a
//! [`GatewayError`] before returning. Callers never see raw JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::subscription::SubscriptionError;

/// Registration status value meaning the card was captured.
pub const REGISTER_STATUS_COMPLETE: i64 = 1;

/// Port for the subscription payment gateway.
///
/// Operations are issued sequentially by the orchestrator; none are retried.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a gateway customer for a member.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError>;

    /// Start the hosted card registration flow.
    ///
    /// The user must be redirected to [`CardRegistration::redirect_url`].
    async fn register_card(
        &self,
        request: RegisterCardRequest,
    ) -> Result<CardRegistration, GatewayError>;

    /// Query the outcome of a card registration by its token.
    async fn get_register_status(&self, token: &str) -> Result<RegisterStatus, GatewayError>;

    /// Subscribe a customer to a plan.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError>;

    /// Fetch a subscription by its gateway id.
    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<GatewaySubscription, GatewayError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    /// Our account id, stored by the gateway as `externalId`.
    pub external_id: String,
}

/// Customer created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub customer_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub external_id: Option<String>,
}

/// Request to start card registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCardRequest {
    pub customer_id: String,
    /// Where the gateway POSTs the user back with the `token`.
    pub return_url: String,
}

/// Hosted card registration handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRegistration {
    pub token: String,
    pub url: String,
}

impl CardRegistration {
    /// Browser destination for the hosted card page.
    pub fn redirect_url(&self) -> String {
        format!("{}?token={}", self.url, self.token)
    }
}

/// Outcome of a card registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterStatus {
    /// `1` when registration completed; absent when the gateway omitted it.
    pub status: Option<i64>,
    pub customer_id: Option<String>,
    pub credit_card_type: Option<String>,
    pub last4_card_digits: Option<String>,
}

impl RegisterStatus {
    /// Returns true only for exactly `status == 1`.
    pub fn is_complete(&self) -> bool {
        self.status == Some(REGISTER_STATUS_COMPLETE)
    }

    /// Status as shown in messages; `null` when absent.
    pub fn status_display(&self) -> String {
        self.status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "null".to_string())
    }
}

/// Request to create a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_id: String,
    pub customer_id: String,
}

/// Subscription as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySubscription {
    pub subscription_id: String,
    pub plan_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: Option<i64>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub next_invoice_date: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway answered without the expected success indicator.
    #[error("gateway rejected request: {message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// The response body was not the JSON we expect.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    /// The request could not be signed.
    #[error("request signing failed: {0}")]
    Signing(String),
}

impl GatewayError {
    pub fn rejected(code: Option<String>, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            code,
            message: message.into(),
        }
    }
}

impl From<GatewayError> for SubscriptionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { code, message } => SubscriptionError::gateway(code, message),
            other => SubscriptionError::gateway(None, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn redirect_url_appends_token() {
        let registration = CardRegistration {
            token: "tok123".to_string(),
            url: "https://sandbox.flow.cl/app/customer/disclaimer".to_string(),
        };
        assert_eq!(
            registration.redirect_url(),
            "https://sandbox.flow.cl/app/customer/disclaimer?token=tok123"
        );
    }

    #[test]
    fn only_status_one_is_complete() {
        let mut status = RegisterStatus {
            status: Some(1),
            customer_id: Some("c1".to_string()),
            credit_card_type: None,
            last4_card_digits: None,
        };
        assert!(status.is_complete());

        for other in [Some(0), Some(2), None] {
            status.status = other;
            assert!(!status.is_complete());
        }
        assert_eq!(status.status_display(), "null");
    }

    #[test]
    fn rejected_error_keeps_provider_fields() {
        let err: SubscriptionError =
            GatewayError::rejected(Some("105".to_string()), "Invalid email").into();
        assert_eq!(err, SubscriptionError::gateway(Some("105".to_string()), "Invalid email"));
    }

    #[test]
    fn transport_error_becomes_codeless_gateway_error() {
        let err: SubscriptionError = GatewayError::Transport("connection refused".to_string()).into();
        assert_eq!(err.status(), "502");
        assert!(err.message().contains("connection refused"));
    }
}
