//! Subscription handlers.
//!
//! ## Commands
//! - Starting a subscription (customer creation and card registration)
//! - Completing card registration from the gateway callback
//!
//! ## Queries
//! - Get a member's subscription

mod activation_holder;
mod complete_card_registration;
mod get_subscription;
mod start_subscription;

// Commands
pub use complete_card_registration::{
    CompleteCardRegistrationCommand, CompleteCardRegistrationHandler,
    CompleteCardRegistrationResult,
};
pub use start_subscription::{
    StartSubscriptionCommand, StartSubscriptionHandler, StartSubscriptionResult,
};

// Queries
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};
