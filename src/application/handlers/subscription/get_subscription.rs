//! GetSubscriptionHandler - Query handler for a member's subscription.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{
    ActivationState, PlanName, SubscriptionError, SubscriptionStatus,
};
use crate::ports::{GatewaySubscription, MemberStore, PaymentGateway};

/// Query for a member's subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// Subscription view.
#[derive(Debug, Clone, PartialEq)]
pub struct GetSubscriptionResult {
    pub state: ActivationState,
    pub plan_name: Option<PlanName>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub created_at: Option<Timestamp>,
    pub activated_at: Option<Timestamp>,
    /// Gateway's view, when a subscription exists and the gateway answered.
    pub gateway: Option<GatewaySubscription>,
}

/// Handler for subscription queries.
pub struct GetSubscriptionHandler {
    gateway: Arc<dyn PaymentGateway>,
    members: Arc<dyn MemberStore>,
}

impl GetSubscriptionHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, members: Arc<dyn MemberStore>) -> Self {
        Self { gateway, members }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<GetSubscriptionResult, SubscriptionError> {
        let member = self.members.find_member_by_uid(&query.user_id).await?.member;
        let sub = member.flow_subscription.as_ref();

        let subscription_id = sub
            .filter(|s| s.has_subscription())
            .map(|s| s.subscription_id.clone());

        // A failed lookup only drops the gateway section.
        let gateway = match &subscription_id {
            Some(id) => match self.gateway.get_subscription(id).await {
                Ok(view) => Some(view),
                Err(err) => {
                    tracing::warn!(
                        member_uid = %member.uid,
                        subscription_id = %id,
                        error = %err,
                        "gateway subscription lookup failed"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(GetSubscriptionResult {
            state: member.activation_state(),
            plan_name: sub.map(|s| s.plan_name),
            customer_id: sub.map(|s| s.customer_id.clone()),
            subscription_id,
            subscription_status: member.subscription_status.clone(),
            created_at: sub.map(|s| s.created_at),
            activated_at: sub.and_then(|s| s.activated_at),
            gateway,
        })
    }
}
