//! Category tree and item classification.

use common::{CategoryId, ItemId};
use domain::{Category, NewCategory};
use store::{Store, Transaction};

use crate::{Result, ServiceError};

/// Service for managing categories.
#[derive(Clone)]
pub struct CategoryService<S> {
    store: S,
}

impl<S: Store> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a category, optionally under an existing parent.
    #[tracing::instrument(skip(self, name))]
    pub async fn create(
        &self,
        name: impl Into<String>,
        parent: Option<CategoryId>,
    ) -> Result<Category> {
        let mut tx = self.store.begin().await?;

        let new_category = match parent {
            Some(parent_id) => {
                if tx.find_category(parent_id).await?.is_none() {
                    return Err(ServiceError::CategoryNotFound(parent_id));
                }
                NewCategory::child_of(parent_id, name)
            }
            None => NewCategory::root(name),
        };
        let category = tx.insert_category(new_category).await?;
        tx.commit().await?;

        Ok(category)
    }

    /// Puts an item into a category. Adding the same item twice is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, category_id: CategoryId, item_id: ItemId) -> Result<Category> {
        let mut tx = self.store.begin().await?;

        let mut category = tx
            .find_category(category_id)
            .await?
            .ok_or(ServiceError::CategoryNotFound(category_id))?;
        if tx.find_item(item_id).await?.is_none() {
            return Err(ServiceError::ItemNotFound(item_id));
        }

        if category.add_item(item_id) {
            tx.add_category_item(category_id, item_id).await?;
            tx.commit().await?;
        }
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: CategoryId) -> Result<Option<Category>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_category(id).await?)
    }

    /// Direct children of a category.
    #[tracing::instrument(skip(self))]
    pub async fn children(&self, id: CategoryId) -> Result<Vec<Category>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_child_categories(id).await?)
    }
}
