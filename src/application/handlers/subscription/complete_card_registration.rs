//! CompleteCardRegistrationHandler - Command handler for the gateway callback.
//!
//! The gateway POSTs the user back with a registration `token`. The handler
//! confirms the registration, subscribes the customer to the member's plan
//! and records the activation.
//!
//! `create_subscription` is only ever called after `get_register_status`
//! reported exactly `status == 1`, and never when the member or its owner is
//! already active with a subscription id. The activation is written to the
//! member found by customer id and, when different, to its owner.

use std::sync::Arc;

use crate::domain::foundation::{StateMachine, Timestamp, UserId};
use crate::domain::subscription::{ActivationState, PlanCatalog, SubscriptionError};
use crate::ports::{CreateSubscriptionRequest, MemberStore, MemberUpdate, PaymentGateway};

use super::activation_holder::find_active_holder;

/// Command carrying the callback form data.
#[derive(Debug, Clone, Default)]
pub struct CompleteCardRegistrationCommand {
    pub token: Option<String>,
}

/// Result of a completed activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteCardRegistrationResult {
    pub member_uid: UserId,
    pub customer_id: String,
    pub subscription_id: String,
    /// True when the member was already active and nothing was changed.
    pub replayed: bool,
    pub state: ActivationState,
}

/// Handler for the card registration callback.
pub struct CompleteCardRegistrationHandler {
    gateway: Arc<dyn PaymentGateway>,
    members: Arc<dyn MemberStore>,
    plans: PlanCatalog,
}

impl CompleteCardRegistrationHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        members: Arc<dyn MemberStore>,
        plans: PlanCatalog,
    ) -> Self {
        Self {
            gateway,
            members,
            plans,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteCardRegistrationCommand,
    ) -> Result<CompleteCardRegistrationResult, SubscriptionError> {
        let state = ActivationState::CardRegistrationPending;
        self.run(cmd, state).await.map_err(|err| {
            tracing::warn!(
                to = ?ActivationState::Failed,
                status = %err.status(),
                error = %err,
                "card registration callback failed"
            );
            err
        })
    }

    async fn run(
        &self,
        cmd: CompleteCardRegistrationCommand,
        mut state: ActivationState,
    ) -> Result<CompleteCardRegistrationResult, SubscriptionError> {
        // 1. Token from the callback body
        let token = cmd
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(SubscriptionError::missing_token)?;

        // 2. Registration must be complete
        let registration = self.gateway.get_register_status(&token).await?;
        if !registration.is_complete() {
            return Err(SubscriptionError::registration_incomplete(
                &registration.status_display(),
            ));
        }
        state = state.transition_to(ActivationState::CardRegistered)?;

        let customer_id = registration.customer_id.ok_or_else(|| {
            SubscriptionError::gateway(None, "registration status did not include a customer id")
        })?;

        // 3. Member owning the gateway customer
        let stored = self
            .members
            .find_member_by_gateway_customer_id(&customer_id)
            .await?
            .ok_or_else(|| SubscriptionError::member_not_found(customer_id.as_str()))?;
        let mut member = stored.member;

        if let Some(holder) = find_active_holder(self.members.as_ref(), &member).await? {
            let subscription_id = holder
                .flow_subscription
                .as_ref()
                .map(|s| s.subscription_id.clone())
                .unwrap_or_default();
            tracing::warn!(
                member_uid = %member.uid,
                holder_uid = %holder.uid,
                customer_id = %customer_id,
                subscription_id = %subscription_id,
                "member already active, ignoring repeated callback"
            );
            return Ok(CompleteCardRegistrationResult {
                member_uid: member.uid,
                customer_id,
                subscription_id,
                replayed: true,
                state: ActivationState::SubscriptionActive,
            });
        }

        let plan = member
            .flow_subscription
            .as_ref()
            .map(|s| s.plan_name)
            .ok_or_else(|| {
                SubscriptionError::validation("flowSuscription", "member has no subscription record")
            })?;

        // 4. Subscribe and record the activation
        let subscription = self
            .gateway
            .create_subscription(CreateSubscriptionRequest {
                plan_id: self.plans.plan_id(plan).to_string(),
                customer_id: customer_id.clone(),
            })
            .await?;

        member.activate(subscription.subscription_id.as_str(), Timestamp::now())?;
        let activation = MemberUpdate::activation(&member);
        self.members.update_member(&stored.id, &activation).await?;
        if member.owner_id != member.uid {
            self.members
                .update_member_by_uid(&member.owner_id, &activation)
                .await?;
        }
        state = state.transition_to(ActivationState::SubscriptionActive)?;

        tracing::info!(
            member_uid = %member.uid,
            customer_id = %customer_id,
            subscription_id = %subscription.subscription_id,
            plan = %plan,
            "subscription activated"
        );

        Ok(CompleteCardRegistrationResult {
            member_uid: member.uid,
            customer_id,
            subscription_id: subscription.subscription_id,
            replayed: false,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::flow::MockPaymentGateway;
    use crate::adapters::memory::InMemoryMemberStore;
    use crate::domain::subscription::{FlowSubscription, Member, PlanName, SubscriptionStatus};
    use crate::ports::GatewayError;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn member_with_customer(plan: PlanName) -> Member {
        let mut member = Member::new(uid("u1"), uid("u1"), "Ana", "a@x.com");
        member.flow_subscription = Some(FlowSubscription::new("c1", plan, Timestamp::now()));
        member
    }

    fn token(t: &str) -> CompleteCardRegistrationCommand {
        CompleteCardRegistrationCommand {
            token: Some(t.to_string()),
        }
    }

    fn setup(
        plans: PlanCatalog,
    ) -> (
        CompleteCardRegistrationHandler,
        Arc<MockPaymentGateway>,
        Arc<InMemoryMemberStore>,
    ) {
        let gateway = Arc::new(MockPaymentGateway::new());
        let members = Arc::new(InMemoryMemberStore::new());
        let handler = CompleteCardRegistrationHandler::new(gateway.clone(), members.clone(), plans);
        (handler, gateway, members)
    }

    #[tokio::test]
    async fn activates_member_after_complete_registration() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        let id = members.insert(member_with_customer(PlanName::Annual)).await;
        gateway.set_register_status(Some(1), Some("c1"));
        gateway.set_subscription_id("s1");

        let result = handler.handle(token("tok123")).await.unwrap();

        assert_eq!(result.subscription_id, "s1");
        assert_eq!(result.state, ActivationState::SubscriptionActive);
        assert!(!result.replayed);

        let stored = members.get(&id).await.unwrap();
        assert_eq!(stored.subscription_status, Some(SubscriptionStatus::Active));
        let sub = stored.flow_subscription.unwrap();
        assert_eq!(sub.subscription_id, "s1");
        assert!(sub.activated_at.is_some());
        assert_eq!(sub.customer_id, "c1");

        assert_eq!(gateway.calls()[0].args, vec!["tok123"]);
        assert_eq!(gateway.calls()[1].args, vec!["Plan Anual", "c1"]);
    }

    #[tokio::test]
    async fn subscribes_with_configured_plan_id() {
        let plans = PlanCatalog::new().with_plan_id(PlanName::Monthly, "PM-01");
        let (handler, gateway, members) = setup(plans);
        members.insert(member_with_customer(PlanName::Monthly)).await;
        gateway.set_register_status(Some(1), Some("c1"));

        handler.handle(token("tok123")).await.unwrap();

        assert_eq!(gateway.calls()[1].args[0], "PM-01");
    }

    #[tokio::test]
    async fn missing_token_makes_no_gateway_call() {
        let (handler, gateway, _members) = setup(PlanCatalog::new());

        for cmd in [
            CompleteCardRegistrationCommand::default(),
            CompleteCardRegistrationCommand {
                token: Some("  ".to_string()),
            },
        ] {
            let err = handler.handle(cmd).await.unwrap_err();
            assert_eq!(err, SubscriptionError::missing_token());
        }
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn incomplete_registration_never_subscribes() {
        for status in [Some(0), Some(2), None] {
            let (handler, gateway, members) = setup(PlanCatalog::new());
            members.insert(member_with_customer(PlanName::Annual)).await;
            gateway.set_register_status(status, Some("c1"));

            let err = handler.handle(token("tok123")).await.unwrap_err();

            let expected = match status {
                Some(s) => format!("\"status\": {}", s),
                None => "\"status\": null".to_string(),
            };
            assert!(err.message().contains(&expected), "{}", err.message());
            assert!(!gateway.was_called("create_subscription"));
        }
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let (handler, gateway, _members) = setup(PlanCatalog::new());
        gateway.set_register_status(Some(1), Some("c404"));

        let err = handler.handle(token("tok123")).await.unwrap_err();

        assert_eq!(err, SubscriptionError::member_not_found("c404"));
        assert_eq!(err.status(), "404");
        assert!(!gateway.was_called("create_subscription"));
    }

    #[tokio::test]
    async fn repeated_callback_for_active_member_is_ignored() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        members.insert(member_with_customer(PlanName::Annual)).await;
        gateway.set_register_status(Some(1), Some("c1"));
        gateway.set_subscription_id("s1");
        handler.handle(token("tok123")).await.unwrap();

        gateway.set_register_status(Some(1), Some("c1"));
        let replay = handler.handle(token("tok123")).await.unwrap();

        assert!(replay.replayed);
        assert_eq!(replay.subscription_id, "s1");
        assert_eq!(gateway.call_count("create_subscription"), 1);
    }

    #[tokio::test]
    async fn gateway_rejection_leaves_member_inactive() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        let id = members.insert(member_with_customer(PlanName::Annual)).await;
        gateway.set_register_status(Some(1), Some("c1"));
        gateway.set_method_error(
            "create_subscription",
            GatewayError::rejected(Some("400".to_string()), "Plan not found"),
        );

        let err = handler.handle(token("tok123")).await.unwrap_err();

        assert_eq!(err.status(), "400");
        assert_eq!(err.message(), "Plan not found");
        let stored = members.get(&id).await.unwrap();
        assert!(!stored.is_active());
        assert_eq!(stored.flow_subscription.unwrap().subscription_id, "");
    }

    #[tokio::test]
    async fn activation_is_written_to_owner_document() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        let mut member = member_with_customer(PlanName::Annual);
        member.uid = uid("profile-1");
        member.owner_id = uid("acct-1");
        members.insert(member).await;
        let owner_id = members
            .insert(Member::new(uid("acct-1"), uid("acct-1"), "Ana", "a@x.com"))
            .await;
        gateway.set_register_status(Some(1), Some("c1"));
        gateway.set_subscription_id("s1");

        handler.handle(token("tok123")).await.unwrap();

        let owner = members.get(&owner_id).await.unwrap();
        assert!(owner.is_active());
        assert_eq!(owner.flow_subscription.unwrap().subscription_id, "s1");
    }

    fn profile_of(owner: &str) -> Member {
        let mut member = member_with_customer(PlanName::Annual);
        member.uid = uid("profile-1");
        member.owner_id = uid(owner);
        member
    }

    #[tokio::test]
    async fn activation_is_written_to_profile_and_owner() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        let profile_id = members.insert(profile_of("acct-1")).await;
        let owner_id = members
            .insert(Member::new(uid("acct-1"), uid("acct-1"), "Ana", "a@x.com"))
            .await;
        gateway.set_register_status(Some(1), Some("c1"));
        gateway.set_subscription_id("s1");

        handler.handle(token("tok123")).await.unwrap();

        for id in [profile_id, owner_id] {
            let stored = members.get(&id).await.unwrap();
            assert!(stored.is_active());
            assert_eq!(stored.flow_subscription.unwrap().subscription_id, "s1");
        }
    }

    #[tokio::test]
    async fn repeated_callback_with_separate_owner_subscribes_once() {
        // Both documents carry the customer id after activation, and the
        // in-memory lookup order varies, so repeat to hit either one.
        for _ in 0..20 {
            let (handler, gateway, members) = setup(PlanCatalog::new());
            members.insert(profile_of("acct-1")).await;
            members
                .insert(Member::new(uid("acct-1"), uid("acct-1"), "Ana", "a@x.com"))
                .await;
            gateway.set_register_status(Some(1), Some("c1"));
            gateway.set_subscription_id("s1");
            handler.handle(token("tok123")).await.unwrap();

            gateway.set_register_status(Some(1), Some("c1"));
            let replay = handler.handle(token("tok123")).await.unwrap();

            assert!(replay.replayed);
            assert_eq!(replay.subscription_id, "s1");
            assert_eq!(gateway.call_count("create_subscription"), 1);
        }
    }

    #[tokio::test]
    async fn callback_for_inactive_profile_of_active_owner_is_a_replay() {
        let (handler, gateway, members) = setup(PlanCatalog::new());
        let profile_id = members.insert(profile_of("acct-1")).await;
        let mut owner = Member::new(uid("acct-1"), uid("acct-1"), "Ana", "a@x.com");
        owner.flow_subscription = Some(FlowSubscription::new(
            "c-other",
            PlanName::Annual,
            Timestamp::now(),
        ));
        owner.activate("s-owner", Timestamp::now()).unwrap();
        members.insert(owner).await;
        gateway.set_register_status(Some(1), Some("c1"));

        let result = handler.handle(token("tok123")).await.unwrap();

        assert!(result.replayed);
        assert_eq!(result.subscription_id, "s-owner");
        assert!(!gateway.was_called("create_subscription"));
        assert!(!members.get(&profile_id).await.unwrap().is_active());
    }
}
