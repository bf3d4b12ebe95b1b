//! Member store port.
//!
//! Privileged access to member documents. Only server-side handlers use it;
//! nothing here is exposed to end users directly.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::foundation::{DomainError, ErrorCode, MemberDocumentId, UserId};
use crate::domain::subscription::{FlowSubscription, Member, SubscriptionStatus};

/// A member together with the id of the document holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMember {
    pub id: MemberDocumentId,
    pub member: Member,
}

/// Partial member data; only `Some` fields are merged into the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberUpdate {
    pub flow_subscription: Option<FlowSubscription>,
    pub subscription_status: Option<SubscriptionStatus>,
}

impl MemberUpdate {
    /// Replace the subscription sub-record.
    pub fn flow_subscription(sub: FlowSubscription) -> Self {
        Self {
            flow_subscription: Some(sub),
            ..Default::default()
        }
    }

    /// Both subscription fields of an activated member.
    pub fn activation(member: &Member) -> Self {
        Self {
            flow_subscription: member.flow_subscription.clone(),
            subscription_status: member.subscription_status.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flow_subscription.is_none() && self.subscription_status.is_none()
    }

    /// Merge into an in-memory member.
    pub fn apply_to(&self, member: &mut Member) {
        if let Some(sub) = &self.flow_subscription {
            member.flow_subscription = Some(sub.clone());
        }
        if let Some(status) = &self.subscription_status {
            member.subscription_status = Some(status.clone());
        }
    }

    /// Top-level document fields to merge, keyed by their stored names.
    pub fn to_patch(&self) -> Result<Value, DomainError> {
        let mut patch = Map::new();
        if let Some(sub) = &self.flow_subscription {
            let value = serde_json::to_value(sub)
                .map_err(|e| DomainError::database(format!("Failed to encode flowSuscription: {}", e)))?;
            patch.insert("flowSuscription".to_string(), value);
        }
        if let Some(status) = &self.subscription_status {
            patch.insert(
                "subscriptionStatus".to_string(),
                Value::String(status.as_str().to_string()),
            );
        }
        Ok(Value::Object(patch))
    }
}

/// Error for a `uid` lookup that matched no document.
pub fn member_not_found(uid: &UserId) -> DomainError {
    DomainError::new(
        ErrorCode::MemberNotFound,
        format!("No member found with uid {}", uid),
    )
    .with_detail("key", uid.as_str())
}

/// Port for member document access.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Find the member whose `uid` field matches.
    ///
    /// Fails with `ErrorCode::MemberNotFound` when nothing matches.
    async fn find_member_by_uid(&self, uid: &UserId) -> Result<StoredMember, DomainError>;

    /// Find the member whose `flowSuscription.customerId` matches.
    async fn find_member_by_gateway_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<StoredMember>, DomainError>;

    /// Merge partial data into the document with the given id.
    async fn update_member(
        &self,
        id: &MemberDocumentId,
        update: &MemberUpdate,
    ) -> Result<(), DomainError>;

    /// Merge partial data into the member with the given `uid`.
    ///
    /// A missing member is logged and ignored.
    async fn update_member_by_uid(
        &self,
        uid: &UserId,
        update: &MemberUpdate,
    ) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::subscription::PlanName;

    fn member() -> Member {
        Member::new(
            UserId::new("u1").unwrap(),
            UserId::new("u1").unwrap(),
            "Ana",
            "a@x.com",
        )
    }

    #[test]
    fn member_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn MemberStore) {}
    }

    #[test]
    fn empty_update_produces_empty_patch() {
        let update = MemberUpdate::default();
        assert!(update.is_empty());
        assert_eq!(update.to_patch().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn patch_uses_document_field_names() {
        let sub = FlowSubscription::new("c1", PlanName::Annual, Timestamp::now());
        let update = MemberUpdate {
            flow_subscription: Some(sub),
            subscription_status: Some(SubscriptionStatus::Active),
        };

        let patch = update.to_patch().unwrap();
        assert_eq!(patch["flowSuscription"]["customerId"], "c1");
        assert_eq!(patch["subscriptionStatus"], "active");
    }

    #[test]
    fn apply_to_only_touches_present_fields() {
        let mut target = member();
        target.subscription_status = Some(SubscriptionStatus::Other("trial".to_string()));

        let sub = FlowSubscription::new("c1", PlanName::Monthly, Timestamp::now());
        MemberUpdate::flow_subscription(sub.clone()).apply_to(&mut target);

        assert_eq!(target.flow_subscription, Some(sub));
        assert_eq!(
            target.subscription_status,
            Some(SubscriptionStatus::Other("trial".to_string()))
        );
        assert_eq!(target.name, "Ana");
    }

    #[test]
    fn not_found_error_carries_key() {
        let err = member_not_found(&UserId::new("u9").unwrap());
        assert_eq!(err.code, ErrorCode::MemberNotFound);
        assert_eq!(err.details.get("key"), Some(&"u9".to_string()));
    }
}
