//! Member profile and its gateway subscription sub-record.
//!
//! Field names on the wire are the document field names used by the
//! member store, including the historical `flowSuscription` spelling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{Timestamp, UserId, ValidationError};

use super::{ActivationState, PlanName};

/// Subscription status recorded on a member.
///
/// Only `active` carries meaning for this service; any other value stored
/// on the document is preserved as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    Other(String),
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Other(s) => s,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        if s == "active" {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Other(s)
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Gateway subscription sub-record (`flowSuscription`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSubscription {
    /// Gateway customer id. Assigned once and never regenerated.
    pub customer_id: String,

    /// Gateway subscription id, empty until the subscription is created.
    #[serde(default)]
    pub subscription_id: String,

    pub plan_name: PlanName,

    pub created_at: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<Timestamp>,

    #[serde(default)]
    pub last_payment_status: bool,
}

impl FlowSubscription {
    /// Sub-record for a freshly created gateway customer.
    pub fn new(customer_id: impl Into<String>, plan_name: PlanName, created_at: Timestamp) -> Self {
        Self {
            customer_id: customer_id.into(),
            subscription_id: String::new(),
            plan_name,
            created_at,
            activated_at: None,
            last_payment_status: false,
        }
    }

    /// Returns true once the gateway subscription exists.
    pub fn has_subscription(&self) -> bool {
        !self.subscription_id.is_empty()
    }
}

/// Member profile as stored in the `members` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub uid: UserId,

    /// Owning account; sent to the gateway as `externalId`.
    pub owner_id: UserId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(rename = "flowSuscription", default, skip_serializing_if = "Option::is_none")]
    pub flow_subscription: Option<FlowSubscription>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,

    /// Document fields owned by other parts of the platform.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Member {
    /// Creates a member without a subscription.
    pub fn new(
        uid: UserId,
        owner_id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            uid,
            owner_id,
            name: name.into(),
            email: email.into(),
            flow_subscription: None,
            subscription_status: None,
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.subscription_status, Some(SubscriptionStatus::Active))
    }

    /// Gateway customer id, if one was created.
    pub fn customer_id(&self) -> Option<&str> {
        self.flow_subscription.as_ref().map(|s| s.customer_id.as_str())
    }

    /// Activation stage derivable from the stored document.
    ///
    /// Card registration happens off-server, so a stored member is never
    /// observed in `CardRegistrationPending` or `CardRegistered`.
    pub fn activation_state(&self) -> ActivationState {
        match &self.flow_subscription {
            None => ActivationState::NoCustomer,
            Some(sub) if self.is_active() && sub.has_subscription() => {
                ActivationState::SubscriptionActive
            }
            Some(_) => ActivationState::CustomerCreated,
        }
    }

    /// Records a successful gateway subscription.
    pub fn activate(
        &mut self,
        subscription_id: impl Into<String>,
        activated_at: Timestamp,
    ) -> Result<(), ValidationError> {
        let subscription_id = subscription_id.into();
        if subscription_id.trim().is_empty() {
            return Err(ValidationError::empty_field("subscriptionId"));
        }
        let sub = self
            .flow_subscription
            .as_mut()
            .ok_or_else(|| ValidationError::empty_field("flowSuscription"))?;

        sub.subscription_id = subscription_id;
        sub.activated_at = Some(activated_at);
        self.subscription_status = Some(SubscriptionStatus::Active);
        Ok(())
    }
}
