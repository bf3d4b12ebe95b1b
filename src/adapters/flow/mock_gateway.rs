//! Mock payment gateway for testing.
//!
//! Configurable in-process implementation of [`PaymentGateway`]. Supports:
//! - Pre-configured responses per operation
//! - Error injection, per method or for the next call
//! - Call tracking
//! - Simulated latency
//!
//! Without configuration it behaves like a cooperative sandbox: customers,
//! registrations and subscriptions get fresh mock ids, and a token issued by
//! `register_card` reports a completed registration for its customer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::ports::{
    CardRegistration, CreateCustomerRequest, CreateSubscriptionRequest, GatewayCustomer,
    GatewayError, GatewaySubscription, PaymentGateway, RegisterCardRequest, RegisterStatus,
    REGISTER_STATUS_COMPLETE,
};

const MOCK_REGISTER_URL: &str = "https://sandbox.flow.cl/app/customer/disclaimer";

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new();
/// mock.set_customer_id("c1");
/// mock.set_method_error("create_subscription", GatewayError::rejected(None, "Plan not found"));
///
/// let result = mock.create_customer(request).await;
/// assert_eq!(mock.call_count("create_customer"), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customer id for the next `create_customer`.
    next_customer_id: Option<String>,

    /// Registration for the next `register_card`.
    next_registration: Option<CardRegistration>,

    /// Status for the next `get_register_status`.
    next_register_status: Option<RegisterStatus>,

    /// Subscription id for the next `create_subscription`.
    next_subscription_id: Option<String>,

    /// Customer behind each issued registration token.
    registrations: HashMap<String, String>,

    /// Subscriptions created so far, by id.
    subscriptions: HashMap<String, GatewaySubscription>,

    /// Error for the next call to any method.
    next_error: Option<GatewayError>,

    /// Errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Delay applied to every call.
    latency: Option<Duration>,

    call_log: Vec<GatewayCall>,
}

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Customer id returned by the next `create_customer`.
    pub fn set_customer_id(&self, customer_id: impl Into<String>) {
        self.state().next_customer_id = Some(customer_id.into());
    }

    /// Registration returned by the next `register_card`.
    pub fn set_registration(&self, token: impl Into<String>, url: impl Into<String>) {
        self.state().next_registration = Some(CardRegistration {
            token: token.into(),
            url: url.into(),
        });
    }

    /// Status returned by the next `get_register_status`.
    pub fn set_register_status(&self, status: Option<i64>, customer_id: Option<&str>) {
        self.state().next_register_status = Some(RegisterStatus {
            status,
            customer_id: customer_id.map(str::to_string),
            credit_card_type: Some("Visa".to_string()),
            last4_card_digits: Some("4425".to_string()),
        });
    }

    /// Subscription id returned by the next `create_subscription`.
    pub fn set_subscription_id(&self, subscription_id: impl Into<String>) {
        self.state().next_subscription_id = Some(subscription_id.into());
    }

    /// Make a subscription visible to `get_subscription`.
    pub fn add_subscription(&self, subscription: GatewaySubscription) {
        self.state()
            .subscriptions
            .insert(subscription.subscription_id.clone(), subscription);
    }

    /// Fail the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Fail every call to `method`.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Delay every call, as a slow gateway would.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Total number of gateway calls.
    pub fn total_calls(&self) -> usize {
        self.state().call_log.len()
    }

    pub fn clear_calls(&self) {
        self.state().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(GatewayCall {
            method: method.to_string(),
            args,
        });
    }

    async fn simulate_latency(&self) {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

fn mock_id(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}_mock_{}", prefix, &simple[..10])
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError> {
        self.record_call(
            "create_customer",
            vec![
                request.name.clone(),
                request.email.clone(),
                request.external_id.clone(),
            ],
        );
        self.simulate_latency().await;
        self.check_error("create_customer")?;

        let customer_id = self
            .state()
            .next_customer_id
            .take()
            .unwrap_or_else(|| mock_id("cus"));

        Ok(GatewayCustomer {
            customer_id,
            name: Some(request.name),
            email: Some(request.email),
            external_id: Some(request.external_id),
        })
    }

    async fn register_card(
        &self,
        request: RegisterCardRequest,
    ) -> Result<CardRegistration, GatewayError> {
        self.record_call(
            "register_card",
            vec![request.customer_id.clone(), request.return_url.clone()],
        );
        self.simulate_latency().await;
        self.check_error("register_card")?;

        let mut state = self.state();
        let registration = state.next_registration.take().unwrap_or_else(|| CardRegistration {
            token: mock_id("tok"),
            url: MOCK_REGISTER_URL.to_string(),
        });
        state
            .registrations
            .insert(registration.token.clone(), request.customer_id);

        Ok(registration)
    }

    async fn get_register_status(&self, token: &str) -> Result<RegisterStatus, GatewayError> {
        self.record_call("get_register_status", vec![token.to_string()]);
        self.simulate_latency().await;
        self.check_error("get_register_status")?;

        let mut state = self.state();
        if let Some(status) = state.next_register_status.take() {
            return Ok(status);
        }

        match state.registrations.get(token) {
            Some(customer_id) => Ok(RegisterStatus {
                status: Some(REGISTER_STATUS_COMPLETE),
                customer_id: Some(customer_id.clone()),
                credit_card_type: Some("Visa".to_string()),
                last4_card_digits: Some("4425".to_string()),
            }),
            None => Err(GatewayError::rejected(
                Some("401".to_string()),
                "Invalid token",
            )),
        }
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.record_call(
            "create_subscription",
            vec![request.plan_id.clone(), request.customer_id.clone()],
        );
        self.simulate_latency().await;
        self.check_error("create_subscription")?;

        let mut state = self.state();
        let subscription_id = state
            .next_subscription_id
            .take()
            .unwrap_or_else(|| mock_id("sus"));

        let subscription = GatewaySubscription {
            subscription_id: subscription_id.clone(),
            plan_id: Some(request.plan_id),
            customer_id: Some(request.customer_id),
            status: Some(1),
            period_start: None,
            period_end: None,
            next_invoice_date: None,
        };
        state.subscriptions.insert(subscription_id, subscription.clone());

        Ok(subscription)
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.record_call("get_subscription", vec![subscription_id.to_string()]);
        self.simulate_latency().await;
        self.check_error("get_subscription")?;

        self.state()
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| GatewayError::rejected(Some("404".to_string()), "Subscription not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_request() -> CreateCustomerRequest {
        CreateCustomerRequest {
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            external_id: "u1".to_string(),
        }
    }

    #[tokio::test]
    async fn configured_customer_id_is_returned_once() {
        let mock = MockPaymentGateway::new();
        mock.set_customer_id("c1");

        let first = mock.create_customer(customer_request()).await.unwrap();
        let second = mock.create_customer(customer_request()).await.unwrap();

        assert_eq!(first.customer_id, "c1");
        assert!(second.customer_id.starts_with("cus_mock_"));
        assert_eq!(mock.call_count("create_customer"), 2);
    }

    #[tokio::test]
    async fn issued_token_reports_complete_registration() {
        let mock = MockPaymentGateway::new();
        let registration = mock
            .register_card(RegisterCardRequest {
                customer_id: "c1".to_string(),
                return_url: "https://app.test/subscription/result".to_string(),
            })
            .await
            .unwrap();

        let status = mock.get_register_status(&registration.token).await.unwrap();
        assert!(status.is_complete());
        assert_eq!(status.customer_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let mock = MockPaymentGateway::new();
        let err = mock.get_register_status("nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn method_error_persists_and_next_error_is_consumed() {
        let mock = MockPaymentGateway::new();
        mock.set_method_error("create_subscription", GatewayError::rejected(None, "Plan not found"));
        mock.set_error(GatewayError::Transport("down".to_string()));

        assert!(mock.create_customer(customer_request()).await.is_err());
        assert!(mock.create_customer(customer_request()).await.is_ok());

        let request = CreateSubscriptionRequest {
            plan_id: "Plan Anual".to_string(),
            customer_id: "c1".to_string(),
        };
        assert!(mock.create_subscription(request.clone()).await.is_err());
        assert!(mock.create_subscription(request).await.is_err());
        assert_eq!(mock.total_calls(), 4);
    }

    #[tokio::test]
    async fn created_subscription_is_retrievable() {
        let mock = MockPaymentGateway::new();
        mock.set_subscription_id("s1");

        mock.create_subscription(CreateSubscriptionRequest {
            plan_id: "Plan Anual".to_string(),
            customer_id: "c1".to_string(),
        })
        .await
        .unwrap();

        let sub = mock.get_subscription("s1").await.unwrap();
        assert_eq!(sub.customer_id.as_deref(), Some("c1"));
        assert_eq!(mock.calls()[1].args, vec!["s1".to_string()]);
    }
}
