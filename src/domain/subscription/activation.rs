//! Activation state machine for a member's gateway subscription.
//!
//! ```text
//! NoCustomer -> CustomerCreated -> CardRegistrationPending -> CardRegistered -> SubscriptionActive
//!      \               \                    \                      \
//!       +---------------+--------------------+----------------------+--> Failed
//! ```
//!
//! The failure reason travels in `SubscriptionError`; the state only records
//! that the run ended in failure.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Stage of the subscription activation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    NoCustomer,
    CustomerCreated,
    CardRegistrationPending,
    CardRegistered,
    SubscriptionActive,
    Failed,
}

impl ActivationState {
    /// Returns true for `SubscriptionActive`.
    pub fn is_active(&self) -> bool {
        matches!(self, ActivationState::SubscriptionActive)
    }
}

impl StateMachine for ActivationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ActivationState::*;
        match self {
            NoCustomer => vec![CustomerCreated, Failed],
            CustomerCreated => vec![CardRegistrationPending, Failed],
            CardRegistrationPending => vec![CardRegistered, Failed],
            CardRegistered => vec![SubscriptionActive, Failed],
            SubscriptionActive | Failed => vec![],
        }
    }
}
