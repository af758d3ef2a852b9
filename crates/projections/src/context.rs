//! Per-read identity map.

use std::collections::HashMap;

use common::{ItemId, MemberId};
use domain::{Item, Member};
use store::{StoreError, Transaction};

use crate::Result;

/// Entities already loaded during one read.
///
/// A member or item referenced by several orders is fetched on first use
/// and served from the map afterwards.
#[derive(Debug, Default)]
pub(crate) struct LoadedEntities {
    members: HashMap<MemberId, Member>,
    items: HashMap<ItemId, Item>,
}

impl LoadedEntities {
    pub(crate) async fn member<T: Transaction>(&mut self, tx: &mut T, id: MemberId) -> Result<Member> {
        if let Some(member) = self.members.get(&id) {
            return Ok(member.clone());
        }
        let member = tx.find_member(id).await?.ok_or(StoreError::NotFound {
            entity: "Member",
            id: id.as_i64(),
        })?;
        self.members.insert(id, member.clone());
        Ok(member)
    }

    pub(crate) async fn item<T: Transaction>(&mut self, tx: &mut T, id: ItemId) -> Result<Item> {
        if let Some(item) = self.items.get(&id) {
            return Ok(item.clone());
        }
        let item = tx.find_item(id).await?.ok_or(StoreError::NotFound {
            entity: "Item",
            id: id.as_i64(),
        })?;
        self.items.insert(id, item.clone());
        Ok(item)
    }
}
