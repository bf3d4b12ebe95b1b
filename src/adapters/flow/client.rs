//! Flow gateway adapter.
//!
//! Implements [`PaymentGateway`] over the gateway's REST API. Every request
//! carries `apiKey` and the `s` signature; writes go as form POSTs and reads
//! as GET query strings.
//!
//! # Configuration
//!
//! ```ignore
//! let client = FlowGatewayClient::new(&config.gateway)?;
//! let customer = client.create_customer(request).await?;
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::ports::{
    CardRegistration, CreateCustomerRequest, CreateSubscriptionRequest, GatewayCustomer,
    GatewayError, GatewaySubscription, PaymentGateway, RegisterCardRequest, RegisterStatus,
};

use super::signature::{GatewaySecret, RequestParams, SignatureError};
use super::wire_types::{
    CustomerResponse, RegisterResponse, RegisterStatusResponse, SubscriptionResponse,
};

const CUSTOMER_CREATE: &str = "/customer/create";
const CUSTOMER_REGISTER: &str = "/customer/register";
const CUSTOMER_REGISTER_STATUS: &str = "/customer/getRegisterStatus";
const SUBSCRIPTION_CREATE: &str = "/subscription/create";
const SUBSCRIPTION_GET: &str = "/subscription/get";

/// Gateway client over reqwest.
#[derive(Debug, Clone)]
pub struct FlowGatewayClient {
    base_url: String,
    api_key: String,
    secret: GatewaySecret,
    http_client: reqwest::Client,
}

impl FlowGatewayClient {
    /// Build a client from configuration.
    ///
    /// Fails when no API secret is configured.
    pub fn new(config: &GatewayConfig) -> Result<Self, SignatureError> {
        let secret = config
            .api_secret
            .clone()
            .ok_or(SignatureError::MissingSecret)
            .and_then(GatewaySecret::from_secret)?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            secret,
            http_client: reqwest::Client::new(),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Adds `apiKey`, signs, and returns the ordered pairs including `s`.
    fn signed(&self, params: RequestParams) -> Result<Vec<(String, String)>, GatewayError> {
        params
            .with("apiKey", &self.api_key)
            .into_signed_pairs(&self.secret)
            .map_err(|e| GatewayError::Signing(e.to_string()))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: RequestParams,
    ) -> Result<T, GatewayError> {
        let form = self.signed(params)?;
        tracing::debug!(path, "gateway POST");

        let response = self
            .http_client
            .post(self.url(path))
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::parse(path, response).await
    }

    async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: RequestParams,
    ) -> Result<T, GatewayError> {
        let query = self.signed(params)?;
        tracing::debug!(path, "gateway GET");

        let response = self
            .http_client
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Self::parse(path, response).await
    }

    /// Error bodies are JSON too, so the body is parsed whatever the status;
    /// the wire type decides success.
    async fn parse<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "gateway returned error status");
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(path, status = status.as_u16(), error = %e, "unparseable gateway response");
            GatewayError::InvalidResponse(format!("HTTP {} from {}: {}", status.as_u16(), path, e))
        })
    }
}

fn log_rejection<T>(operation: &'static str, result: &Result<T, GatewayError>) {
    if let Err(GatewayError::Rejected { code, message }) = result {
        tracing::warn!(operation, code = ?code, message = %message, "gateway rejected request");
    }
}

#[async_trait]
impl PaymentGateway for FlowGatewayClient {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError> {
        let params = RequestParams::new()
            .with("name", request.name)
            .with("email", request.email)
            .with("externalId", request.external_id);

        let response: CustomerResponse = self.post_form(CUSTOMER_CREATE, params).await?;
        let result = response.into_result();
        log_rejection("create_customer", &result);
        result
    }

    async fn register_card(
        &self,
        request: RegisterCardRequest,
    ) -> Result<CardRegistration, GatewayError> {
        let params = RequestParams::new()
            .with("customerId", request.customer_id)
            .with("url_return", request.return_url);

        let response: RegisterResponse = self.post_form(CUSTOMER_REGISTER, params).await?;
        let result = response.into_result();
        log_rejection("register_card", &result);
        result
    }

    async fn get_register_status(&self, token: &str) -> Result<RegisterStatus, GatewayError> {
        let params = RequestParams::new().with("token", token);

        let response: RegisterStatusResponse =
            self.get_query(CUSTOMER_REGISTER_STATUS, params).await?;
        let result = response.into_result();
        log_rejection("get_register_status", &result);
        result
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        let params = RequestParams::new()
            .with("planId", request.plan_id)
            .with("customerId", request.customer_id);

        let response: SubscriptionResponse = self.post_form(SUBSCRIPTION_CREATE, params).await?;
        let result = response.into_result();
        log_rejection("create_subscription", &result);
        result
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<GatewaySubscription, GatewayError> {
        let params = RequestParams::new().with("subscriptionId", subscription_id);

        let response: SubscriptionResponse = self.get_query(SUBSCRIPTION_GET, params).await?;
        let result = response.into_result();
        log_rejection("get_subscription", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FlowGatewayClient {
        FlowGatewayClient::new(
            &GatewayConfig::new("key-1", "secret-1").with_base_url("https://sandbox.flow.cl/api/"),
        )
        .unwrap()
    }

    #[test]
    fn missing_secret_fails_construction() {
        let mut config = GatewayConfig::new("key-1", "secret-1");
        config.api_secret = None;
        assert_eq!(FlowGatewayClient::new(&config).unwrap_err(), SignatureError::MissingSecret);
    }

    #[test]
    fn empty_secret_fails_construction() {
        let config = GatewayConfig::new("key-1", "");
        assert_eq!(FlowGatewayClient::new(&config).unwrap_err(), SignatureError::MissingSecret);
    }

    #[test]
    fn urls_join_without_double_slash() {
        assert_eq!(client().url(CUSTOMER_CREATE), "https://sandbox.flow.cl/api/customer/create");
    }

    #[test]
    fn signed_pairs_include_api_key_in_signature() {
        let pairs = client()
            .signed(RequestParams::new().with("token", "tok123"))
            .unwrap();

        let expected = RequestParams::new()
            .with("apiKey", "key-1")
            .with("token", "tok123")
            .sign(&GatewaySecret::new("secret-1").unwrap())
            .unwrap();

        assert_eq!(
            pairs,
            vec![
                ("apiKey".to_string(), "key-1".to_string()),
                ("token".to_string(), "tok123".to_string()),
                ("s".to_string(), expected),
            ]
        );
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret-1"));
    }
}
