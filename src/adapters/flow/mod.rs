//! Flow payment gateway adapter.
//!
//! - `signature` - canonical parameter string and HMAC-SHA256 signing
//! - `client` - reqwest implementation of [`PaymentGateway`](crate::ports::PaymentGateway)
//! - `wire_types` - response bodies and their validation
//! - `mock_gateway` - in-process gateway for tests and local runs

mod client;
mod mock_gateway;
mod signature;
mod wire_types;

pub use client::FlowGatewayClient;
pub use mock_gateway::{GatewayCall, MockPaymentGateway};
pub use signature::{hex_encode, GatewaySecret, RequestParams, SignatureError, SIGNATURE_PARAM};
pub use wire_types::{
    CustomerResponse, ProviderFault, RegisterResponse, RegisterStatusResponse,
    SubscriptionResponse,
};
