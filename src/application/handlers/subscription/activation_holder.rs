//! Lookup of the document that holds a member's activation.
//!
//! Activation is written to the owner's document. A profile whose `uid`
//! differs from its `ownerId` can still look inactive on its own, so both
//! documents are consulted before anything is started or subscribed.

use crate::domain::foundation::ErrorCode;
use crate::domain::subscription::{Member, SubscriptionError};
use crate::ports::MemberStore;

/// The active document among `member` and its owner, if either is active.
pub(super) async fn find_active_holder(
    members: &dyn MemberStore,
    member: &Member,
) -> Result<Option<Member>, SubscriptionError> {
    if member.activation_state().is_active() {
        return Ok(Some(member.clone()));
    }
    if member.owner_id == member.uid {
        return Ok(None);
    }

    match members.find_member_by_uid(&member.owner_id).await {
        Ok(owner) if owner.member.activation_state().is_active() => Ok(Some(owner.member)),
        Ok(_) => Ok(None),
        Err(err) if err.code == ErrorCode::MemberNotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}
