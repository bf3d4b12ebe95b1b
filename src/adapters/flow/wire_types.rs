//! Gateway JSON responses.
//!
//! Every field is optional on the wire. A response counts as successful only
//! when its success indicator is present; otherwise the provider's `code` and
//! `message` become a [`GatewayError::Rejected`].
//!
//! The gateway is loose with scalar types: `code` and `status` may arrive as
//! numbers or numeric strings, so both are accepted.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ports::{
    CardRegistration, GatewayCustomer, GatewayError, GatewaySubscription, RegisterStatus,
};

// ════════════════════════════════════════════════════════════════════════════════
// Provider Fault
// ════════════════════════════════════════════════════════════════════════════════

/// `code`/`message` pair present on error responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFault {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

impl ProviderFault {
    /// Rejection carrying the provider's fields, or `fallback` when it sent none.
    pub fn into_error(self, fallback: &str) -> GatewayError {
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        GatewayError::rejected(self.code, message)
    }

    fn is_present(&self) -> bool {
        self.code.is_some() || self.message.is_some()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Customer
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `customer/create`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub external_id: Option<String>,
    #[serde(flatten)]
    pub fault: ProviderFault,
}

impl CustomerResponse {
    pub fn into_result(self) -> Result<GatewayCustomer, GatewayError> {
        match non_blank(self.customer_id) {
            Some(customer_id) => Ok(GatewayCustomer {
                customer_id,
                name: self.name,
                email: self.email,
                external_id: self.external_id,
            }),
            None => Err(self.fault.into_error("customer was not created")),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Card Registration
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `customer/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub token: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub fault: ProviderFault,
}

impl RegisterResponse {
    pub fn into_result(self) -> Result<CardRegistration, GatewayError> {
        match (non_blank(self.url), non_blank(self.token)) {
            (Some(url), Some(token)) => Ok(CardRegistration { token, url }),
            _ => Err(self.fault.into_error("card registration was not started")),
        }
    }
}

/// Response of `customer/getRegisterStatus`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStatusResponse {
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    pub credit_card_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last4_card_digits: Option<String>,
    #[serde(flatten)]
    pub fault: ProviderFault,
}

impl RegisterStatusResponse {
    /// A response with no status and no customer but a fault is a rejection.
    /// Anything else is returned as-is; the caller decides what status means.
    pub fn into_result(self) -> Result<RegisterStatus, GatewayError> {
        if self.status.is_none() && self.customer_id.is_none() && self.fault.is_present() {
            return Err(self.fault.into_error("registration status unavailable"));
        }
        Ok(RegisterStatus {
            status: self.status,
            customer_id: non_blank(self.customer_id),
            credit_card_type: self.credit_card_type,
            last4_card_digits: self.last4_card_digits,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription
// ════════════════════════════════════════════════════════════════════════════════

/// Response of `subscription/create` and `subscription/get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub subscription_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plan_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: Option<i64>,
    #[serde(alias = "period_start")]
    pub period_start: Option<String>,
    #[serde(alias = "period_end")]
    pub period_end: Option<String>,
    #[serde(alias = "next_invoice_date")]
    pub next_invoice_date: Option<String>,
    #[serde(flatten)]
    pub fault: ProviderFault,
}

impl SubscriptionResponse {
    pub fn into_result(self) -> Result<GatewaySubscription, GatewayError> {
        match non_blank(self.subscription_id) {
            Some(subscription_id) => Ok(GatewaySubscription {
                subscription_id,
                plan_id: self.plan_id,
                customer_id: self.customer_id,
                status: self.status,
                period_start: self.period_start,
                period_end: self.period_end,
                next_invoice_date: self.next_invoice_date,
            }),
            None => Err(self.fault.into_error("subscription was not created")),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Lenient scalars
// ════════════════════════════════════════════════════════════════════════════════

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts a string or a number; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts an integer or an integer string; anything else reads as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn customer_with_id_is_success() {
        let response: CustomerResponse = serde_json::from_value(json!({
            "customerId": "cus_onav7wp2t2",
            "name": "Ana",
            "email": "ana@x.com",
            "externalId": "u1",
            "created": "2024-01-01 10:00:00",
            "status": 1
        }))
        .unwrap();

        let customer = response.into_result().unwrap();
        assert_eq!(customer.customer_id, "cus_onav7wp2t2");
        assert_eq!(customer.external_id.as_deref(), Some("u1"));
    }

    #[test]
    fn customer_without_id_is_rejected_with_provider_fields() {
        let response: CustomerResponse =
            serde_json::from_value(json!({"code": 105, "message": "Invalid email"})).unwrap();

        assert_eq!(
            response.into_result().unwrap_err(),
            GatewayError::rejected(Some("105".to_string()), "Invalid email")
        );
    }

    #[test]
    fn empty_body_gets_fallback_message() {
        let response: CustomerResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            response.into_result().unwrap_err(),
            GatewayError::rejected(None, "customer was not created")
        );
    }

    #[test]
    fn register_requires_url_and_token() {
        let ok: RegisterResponse = serde_json::from_value(json!({
            "url": "https://sandbox.flow.cl/app/customer/disclaimer",
            "token": "tok123"
        }))
        .unwrap();
        assert_eq!(ok.into_result().unwrap().token, "tok123");

        let missing_token: RegisterResponse =
            serde_json::from_value(json!({"url": "https://sandbox.flow.cl/x"})).unwrap();
        assert!(missing_token.into_result().is_err());
    }

    #[test]
    fn register_status_accepts_string_status() {
        let response: RegisterStatusResponse = serde_json::from_value(json!({
            "status": "1",
            "customerId": "c1",
            "creditCardType": "Visa",
            "last4CardDigits": "4425"
        }))
        .unwrap();

        let status = response.into_result().unwrap();
        assert!(status.is_complete());
        assert_eq!(status.last4_card_digits.as_deref(), Some("4425"));
    }

    #[test]
    fn register_status_incomplete_is_not_an_error() {
        let response: RegisterStatusResponse =
            serde_json::from_value(json!({"status": 0, "customerId": "c1"})).unwrap();

        let status = response.into_result().unwrap();
        assert_eq!(status.status, Some(0));
        assert!(!status.is_complete());
    }

    #[test]
    fn register_status_fault_only_is_rejected() {
        let response: RegisterStatusResponse =
            serde_json::from_value(json!({"code": "401", "message": "Invalid token"})).unwrap();

        assert_eq!(
            response.into_result().unwrap_err(),
            GatewayError::rejected(Some("401".to_string()), "Invalid token")
        );
    }

    #[test]
    fn subscription_requires_subscription_id() {
        let ok: SubscriptionResponse = serde_json::from_value(json!({
            "subscriptionId": "sus_azcyjj9ycd",
            "planId": "Plan Mensual",
            "customerId": "c1",
            "status": 1,
            "period_start": "2024-01-01",
            "next_invoice_date": "2024-02-01"
        }))
        .unwrap();
        let sub = ok.into_result().unwrap();
        assert_eq!(sub.subscription_id, "sus_azcyjj9ycd");
        assert_eq!(sub.status, Some(1));
        assert_eq!(sub.period_start.as_deref(), Some("2024-01-01"));
        assert_eq!(sub.next_invoice_date.as_deref(), Some("2024-02-01"));

        let rejected: SubscriptionResponse =
            serde_json::from_value(json!({"code": 400, "message": "Plan not found"})).unwrap();
        assert_eq!(
            rejected.into_result().unwrap_err(),
            GatewayError::rejected(Some("400".to_string()), "Plan not found")
        );
    }

    #[test]
    fn non_numeric_status_reads_as_absent() {
        let response: RegisterStatusResponse =
            serde_json::from_value(json!({"status": "pending", "customerId": "c1"})).unwrap();
        assert_eq!(response.into_result().unwrap().status, None);
    }
}
