//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentGateway` - HMAC-signed subscription gateway
//! - `MemberStore` - Privileged member document access

mod gateway;
mod member_store;

pub use gateway::{
    CardRegistration, CreateCustomerRequest, CreateSubscriptionRequest, GatewayCustomer,
    GatewayError, GatewaySubscription, PaymentGateway, RegisterCardRequest, RegisterStatus,
    REGISTER_STATUS_COMPLETE,
};
pub use member_store::{member_not_found, MemberStore, MemberUpdate, StoredMember};
