//! Subscription domain module.
//!
//! Member documents, the gateway subscription sub-record, plans and the
//! activation state machine.

mod activation;
mod errors;
mod member;
mod plan;

pub use activation::ActivationState;
pub use errors::SubscriptionError;
pub use member::{FlowSubscription, Member, SubscriptionStatus};
pub use plan::{PlanCatalog, PlanName};
