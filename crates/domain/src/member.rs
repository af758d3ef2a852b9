//! Member entity.

use common::MemberId;
use serde::{Deserialize, Serialize};

use crate::Address;

/// A registered member.
///
/// The orders placed by a member are looked up through the store; the member
/// itself holds no reference to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub address: Address,
}

/// Registration data for a member that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub address: Address,
}

impl NewMember {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    /// Attaches the storage key assigned on insert.
    pub fn with_id(self, id: MemberId) -> Member {
        Member {
            id,
            name: self.name,
            address: self.address,
        }
    }
}

impl Member {
    /// Renames the member.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
