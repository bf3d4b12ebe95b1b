//! In-Memory Member Store Adapter
//!
//! Keeps member documents in memory. Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, MemberDocumentId, UserId};
use crate::domain::subscription::Member;
use crate::ports::{member_not_found, MemberStore, MemberUpdate, StoredMember};

/// In-memory storage for member documents
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberStore {
    members: Arc<RwLock<HashMap<MemberDocumentId, Member>>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a member under a fresh document id
    pub async fn insert(&self, member: Member) -> MemberDocumentId {
        let id = MemberDocumentId::new();
        self.members.write().await.insert(id, member);
        id
    }

    /// Current document contents, by document id
    pub async fn get(&self, id: &MemberDocumentId) -> Option<Member> {
        self.members.read().await.get(id).cloned()
    }

    /// Current document contents, by `uid`
    pub async fn get_by_uid(&self, uid: &str) -> Option<Member> {
        self.members
            .read()
            .await
            .values()
            .find(|m| m.uid.as_str() == uid)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

fn find_by<'a>(
    members: &'a HashMap<MemberDocumentId, Member>,
    predicate: impl Fn(&Member) -> bool,
) -> Option<(&'a MemberDocumentId, &'a Member)> {
    members.iter().find(|(_, member)| predicate(member))
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn find_member_by_uid(&self, uid: &UserId) -> Result<StoredMember, DomainError> {
        let members = self.members.read().await;
        find_by(&members, |m| &m.uid == uid)
            .map(|(id, member)| StoredMember {
                id: *id,
                member: member.clone(),
            })
            .ok_or_else(|| member_not_found(uid))
    }

    async fn find_member_by_gateway_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<StoredMember>, DomainError> {
        let members = self.members.read().await;
        Ok(
            find_by(&members, |m| m.customer_id() == Some(customer_id)).map(|(id, member)| {
                StoredMember {
                    id: *id,
                    member: member.clone(),
                }
            }),
        )
    }

    async fn update_member(
        &self,
        id: &MemberDocumentId,
        update: &MemberUpdate,
    ) -> Result<(), DomainError> {
        let mut members = self.members.write().await;
        let member = members.get_mut(id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::MemberNotFound,
                format!("Member document {} not found", id),
            )
            .with_detail("key", id.to_string())
        })?;
        update.apply_to(member);
        Ok(())
    }

    async fn update_member_by_uid(
        &self,
        uid: &UserId,
        update: &MemberUpdate,
    ) -> Result<(), DomainError> {
        let mut members = self.members.write().await;
        match members.values_mut().find(|m| &m.uid == uid) {
            Some(member) => update.apply_to(member),
            None => tracing::warn!(member_uid = %uid, "no member document to update"),
        }
        Ok(())
    }
}
