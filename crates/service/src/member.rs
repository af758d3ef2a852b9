//! Member registration and lookup.

use common::MemberId;
use domain::{Member, NewMember};
use store::{Store, Transaction, TransactionExt};

use crate::{Result, ServiceError};

/// Service for managing members.
#[derive(Clone)]
pub struct MemberService<S> {
    store: S,
}

impl<S: Store> MemberService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new member.
    ///
    /// The name is checked against existing members first; the storage
    /// constraint on member names catches a concurrent registration that
    /// slips past the check.
    #[tracing::instrument(skip(self, member), fields(name = %member.name))]
    pub async fn join(&self, member: NewMember) -> Result<MemberId> {
        let mut tx = self.store.begin().await?;

        if tx.member_name_taken(&member.name).await? {
            tracing::debug!("member name already taken");
            return Err(ServiceError::DuplicateMember { name: member.name });
        }

        let name = member.name.clone();
        let saved = tx
            .insert_member(member)
            .await
            .map_err(|e| ServiceError::member_write(e, &name))?;
        tx.commit().await?;

        metrics::counter!("members_joined_total").increment(1);
        tracing::info!(member_id = %saved.id, "member joined");
        Ok(saved.id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_members(&self) -> Result<Vec<Member>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_all_members().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: MemberId) -> Result<Option<Member>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_member(id).await?)
    }

    /// Renames a member. Returns `None` if the member does not exist.
    #[tracing::instrument(skip(self, name))]
    pub async fn update(&self, id: MemberId, name: impl Into<String>) -> Result<Option<Member>> {
        let name = name.into();
        let mut tx = self.store.begin().await?;

        let Some(mut member) = tx.find_member(id).await? else {
            return Ok(None);
        };
        member.rename(name.as_str());
        tx.update_member(&member)
            .await
            .map_err(|e| ServiceError::member_write(e, &name))?;
        tx.commit().await?;

        Ok(Some(member))
    }
}
