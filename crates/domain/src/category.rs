//! Category tree.

use common::{CategoryId, ItemId};
use serde::{Deserialize, Serialize};

/// A category node.
///
/// Children are found by querying for categories whose parent is this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub item_ids: Vec<ItemId>,
}

/// A category that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child_of(parent: CategoryId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent),
        }
    }

    /// Attaches the storage key assigned on insert.
    pub fn with_id(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            parent_id: self.parent_id,
            item_ids: Vec::new(),
        }
    }
}

impl Category {
    /// Links an item to this category. Linking twice is a no-op.
    pub fn add_item(&mut self, item_id: ItemId) -> bool {
        if self.item_ids.contains(&item_id) {
            return false;
        }
        self.item_ids.push(item_id);
        true
    }
}
