//! Item catalogue.

use common::ItemId;
use domain::{Item, Money, NewItem};
use store::{Store, Transaction};

use crate::Result;

/// Service for managing items.
#[derive(Clone)]
pub struct ItemService<S> {
    store: S,
}

impl<S: Store> ItemService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers an item. The price must lie in `0..=Item::MAX_PRICE`.
    #[tracing::instrument(skip(self, item), fields(name = %item.name, dtype = item.kind.dtype()))]
    pub async fn save_item(&self, item: NewItem) -> Result<Item> {
        Item::check_price(item.price)?;
        let mut tx = self.store.begin().await?;
        let saved = tx.insert_item(item).await?;
        tx.commit().await?;

        tracing::info!(item_id = %saved.id, "item saved");
        Ok(saved)
    }

    /// Overwrites name, price and stock of an item.
    ///
    /// Returns `None` if the item does not exist. The price is checked like in
    /// [`ItemService::save_item`].
    #[tracing::instrument(skip(self, name))]
    pub async fn update_item(
        &self,
        id: ItemId,
        name: impl Into<String>,
        price: Money,
        stock_quantity: u32,
    ) -> Result<Option<Item>> {
        Item::check_price(price)?;
        let mut tx = self.store.begin().await?;

        let Some(mut item) = tx.find_item(id).await? else {
            return Ok(None);
        };
        item.update(name, price, stock_quantity);
        tx.update_item(&item).await?;
        tx.commit().await?;

        Ok(Some(item))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_items(&self) -> Result<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_all_items().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_one(&self, id: ItemId) -> Result<Option<Item>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find_item(id).await?)
    }
}
