//! StartSubscriptionHandler - Command handler for the first half of activation.
//!
//! Ensures the member has a gateway customer, then opens the hosted card
//! registration page. The caller redirects the browser to
//! [`StartSubscriptionResult::redirect_url`]; the flow resumes in
//! [`CompleteCardRegistrationHandler`](super::CompleteCardRegistrationHandler).

use std::sync::Arc;

use crate::domain::foundation::{StateMachine, Timestamp, UserId};
use crate::domain::subscription::{
    ActivationState, FlowSubscription, PlanName, SubscriptionError,
};
use crate::ports::{
    CreateCustomerRequest, MemberStore, MemberUpdate, PaymentGateway, RegisterCardRequest,
    StoredMember,
};

use super::activation_holder::find_active_holder;

/// Command to start a subscription.
#[derive(Debug, Clone)]
pub struct StartSubscriptionCommand {
    pub user_id: UserId,
    pub plan: PlanName,
    /// Where the gateway returns the user after card registration.
    pub return_url: String,
}

/// Result of a started subscription.
#[derive(Debug, Clone)]
pub struct StartSubscriptionResult {
    /// Hosted card page, token included.
    pub redirect_url: String,
    pub subscription: FlowSubscription,
    /// False when an existing gateway customer was reused.
    pub customer_created: bool,
    pub state: ActivationState,
}

/// Handler for starting a subscription.
pub struct StartSubscriptionHandler {
    gateway: Arc<dyn PaymentGateway>,
    members: Arc<dyn MemberStore>,
}

impl StartSubscriptionHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, members: Arc<dyn MemberStore>) -> Self {
        Self { gateway, members }
    }

    pub async fn handle(
        &self,
        cmd: StartSubscriptionCommand,
    ) -> Result<StartSubscriptionResult, SubscriptionError> {
        let stored = self.members.find_member_by_uid(&cmd.user_id).await?;

        if find_active_holder(self.members.as_ref(), &stored.member)
            .await?
            .is_some()
        {
            return Err(SubscriptionError::already_active());
        }

        let mut state = stored.member.activation_state();
        let customer_created = stored.member.flow_subscription.is_none();

        // 1. Ensure a gateway customer exists
        let subscription = match self.ensure_customer(&stored, cmd.plan).await {
            Ok(subscription) => subscription,
            Err(err) => return Err(fail(state, &cmd.user_id, err)),
        };
        if customer_created {
            state = state.transition_to(ActivationState::CustomerCreated)?;
        }

        // 2. Open hosted card registration
        let registration = match self
            .gateway
            .register_card(RegisterCardRequest {
                customer_id: subscription.customer_id.clone(),
                return_url: cmd.return_url,
            })
            .await
        {
            Ok(registration) => registration,
            Err(err) => return Err(fail(state, &cmd.user_id, err.into())),
        };
        state = state.transition_to(ActivationState::CardRegistrationPending)?;

        tracing::info!(
            member_uid = %cmd.user_id,
            customer_id = %subscription.customer_id,
            plan = %subscription.plan_name,
            "card registration started"
        );

        Ok(StartSubscriptionResult {
            redirect_url: registration.redirect_url(),
            subscription,
            customer_created,
            state,
        })
    }

    /// Returns the member's sub-record, creating the gateway customer the
    /// first time. An existing sub-record only has its plan updated.
    async fn ensure_customer(
        &self,
        stored: &StoredMember,
        plan: PlanName,
    ) -> Result<FlowSubscription, SubscriptionError> {
        let member = &stored.member;

        if let Some(existing) = &member.flow_subscription {
            if existing.plan_name == plan {
                return Ok(existing.clone());
            }
            let mut updated = existing.clone();
            updated.plan_name = plan;
            self.members
                .update_member(&stored.id, &MemberUpdate::flow_subscription(updated.clone()))
                .await?;
            tracing::info!(
                member_uid = %member.uid,
                from = %existing.plan_name,
                to = %plan,
                "plan changed before activation"
            );
            return Ok(updated);
        }

        let customer = self
            .gateway
            .create_customer(CreateCustomerRequest {
                name: member.name.clone(),
                email: member.email.clone(),
                external_id: member.owner_id.to_string(),
            })
            .await?;

        let subscription = FlowSubscription::new(customer.customer_id, plan, Timestamp::now());
        self.members
            .update_member(&stored.id, &MemberUpdate::flow_subscription(subscription.clone()))
            .await?;

        tracing::info!(
            member_uid = %member.uid,
            customer_id = %subscription.customer_id,
            "gateway customer created"
        );
        Ok(subscription)
    }
}

fn fail(state: ActivationState, user_id: &UserId, err: SubscriptionError) -> SubscriptionError {
    tracing::warn!(
        member_uid = %user_id,
        from = ?state,
        to = ?ActivationState::Failed,
        status = %err.status(),
        error = %err,
        "subscription start failed"
    );
    err
}
