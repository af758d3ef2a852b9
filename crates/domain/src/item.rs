//! Catalog items.

use common::ItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Money;

/// Errors raised when adjusting stock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Not enough stock left to satisfy the request.
    #[error("need more stock: item {item_id} has {available}, requested {requested}")]
    NotEnoughStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// Restoring stock would exceed the storable quantity.
    #[error("stock overflow: item {item_id} has {available}, restoring {restoring}")]
    Overflow {
        item_id: ItemId,
        restoring: u32,
        available: u32,
    },
}

/// Errors raised when registering or editing an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// Price is negative or above [`Item::MAX_PRICE`].
    #[error("invalid price: {price} (must be between 0 and {max})", max = Item::MAX_PRICE)]
    InvalidPrice { price: Money },
}

/// Variant-specific attributes of an item.
///
/// All variants share one storage table; the discriminant column holds
/// [`ItemKind::dtype`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dtype")]
pub enum ItemKind {
    #[serde(rename = "B")]
    Book { author: String, isbn: String },
    #[serde(rename = "A")]
    Album { artist: String, etc: String },
    #[serde(rename = "M")]
    Movie { director: String, actor: String },
}

impl ItemKind {
    /// Returns the single-letter discriminant stored with the item.
    pub fn dtype(&self) -> &'static str {
        match self {
            ItemKind::Book { .. } => "B",
            ItemKind::Album { .. } => "A",
            ItemKind::Movie { .. } => "M",
        }
    }
}

/// A catalog item with stock tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    stock_quantity: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

/// An item that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub price: Money,
    pub stock_quantity: u32,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl NewItem {
    pub fn book(
        name: impl Into<String>,
        price: Money,
        stock_quantity: u32,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            stock_quantity,
            kind: ItemKind::Book {
                author: author.into(),
                isbn: isbn.into(),
            },
        }
    }

    /// Attaches the storage key assigned on insert.
    pub fn with_id(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            price: self.price,
            stock_quantity: self.stock_quantity,
            kind: self.kind,
        }
    }
}

impl Item {
    /// Highest accepted price: any count of a single line still fits in [`Money`].
    pub const MAX_PRICE: Money = Money::new(i64::MAX / u32::MAX as i64);

    /// Accepts prices in `0..=MAX_PRICE`.
    pub fn check_price(price: Money) -> Result<Money, ItemError> {
        if price.is_negative() || price > Self::MAX_PRICE {
            return Err(ItemError::InvalidPrice { price });
        }
        Ok(price)
    }

    /// Rebuilds an item from stored columns.
    pub fn from_parts(
        id: ItemId,
        name: impl Into<String>,
        price: Money,
        stock_quantity: u32,
        kind: ItemKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock_quantity,
            kind,
        }
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    /// Checks that `quantity` can be given back without overflowing.
    pub fn can_add_stock(&self, quantity: u32) -> Result<(), StockError> {
        self.stock_quantity
            .checked_add(quantity)
            .map(|_| ())
            .ok_or(StockError::Overflow {
                item_id: self.id,
                restoring: quantity,
                available: self.stock_quantity,
            })
    }

    /// Increases stock, failing without change on overflow.
    pub fn add_stock(&mut self, quantity: u32) -> Result<(), StockError> {
        self.can_add_stock(quantity)?;
        self.stock_quantity += quantity;
        Ok(())
    }

    /// Decreases stock, failing without change if it would go below zero.
    pub fn remove_stock(&mut self, quantity: u32) -> Result<(), StockError> {
        let rest = self
            .stock_quantity
            .checked_sub(quantity)
            .ok_or(StockError::NotEnoughStock {
                item_id: self.id,
                requested: quantity,
                available: self.stock_quantity,
            })?;
        self.stock_quantity = rest;
        Ok(())
    }

    /// Overwrites the editable fields.
    pub fn update(&mut self, name: impl Into<String>, price: Money, stock_quantity: u32) {
        self.name = name.into();
        self.price = price;
        self.stock_quantity = stock_quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(stock: u32) -> Item {
        NewItem::book("JPA", Money::new(10000), stock, "kim", "978-0").with_id(ItemId::new(1))
    }

    #[test]
    fn remove_stock_decrements() {
        let mut item = book(10);
        item.remove_stock(3).unwrap();
        assert_eq!(item.stock_quantity(), 7);
    }

    #[test]
    fn remove_stock_to_exactly_zero() {
        let mut item = book(2);
        item.remove_stock(2).unwrap();
        assert_eq!(item.stock_quantity(), 0);
    }

    #[test]
    fn remove_stock_beyond_available_fails_without_change() {
        let mut item = book(2);
        let err = item.remove_stock(3).unwrap_err();
        assert_eq!(
            err,
            StockError::NotEnoughStock {
                item_id: ItemId::new(1),
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(item.stock_quantity(), 2);
    }

    #[test]
    fn add_stock_increments() {
        let mut item = book(1);
        item.add_stock(4).unwrap();
        assert_eq!(item.stock_quantity(), 5);
    }

    #[test]
    fn add_stock_past_the_limit_fails_without_change() {
        let mut item = book(u32::MAX - 1);
        let err = item.add_stock(2).unwrap_err();
        assert_eq!(
            err,
            StockError::Overflow {
                item_id: ItemId::new(1),
                restoring: 2,
                available: u32::MAX - 1,
            }
        );
        assert_eq!(item.stock_quantity(), u32::MAX - 1);
        item.add_stock(1).unwrap();
        assert_eq!(item.stock_quantity(), u32::MAX);
    }

    #[test]
    fn price_bounds() {
        assert_eq!(Item::check_price(Money::zero()), Ok(Money::zero()));
        assert_eq!(Item::check_price(Item::MAX_PRICE), Ok(Item::MAX_PRICE));
        assert!(Item::MAX_PRICE.checked_multiply(u32::MAX).is_some());

        let over = Money::new(Item::MAX_PRICE.amount() + 1);
        assert_eq!(
            Item::check_price(over),
            Err(ItemError::InvalidPrice { price: over })
        );
        assert!(Item::check_price(Money::new(-1)).is_err());
    }

    #[test]
    fn update_overwrites_editable_fields() {
        let mut item = book(1);
        item.update("JPA 2nd", Money::new(12000), 9);
        assert_eq!(item.name, "JPA 2nd");
        assert_eq!(item.price, Money::new(12000));
        assert_eq!(item.stock_quantity(), 9);
        assert_eq!(item.kind.dtype(), "B");
    }

    #[test]
    fn kind_serializes_with_discriminant() {
        let json = serde_json::to_value(book(1)).unwrap();
        assert_eq!(json["dtype"], "B");
        assert_eq!(json["author"], "kim");
        assert_eq!(json["stock_quantity"], 1);
    }

    #[test]
    fn dtype_per_variant() {
        let album = ItemKind::Album {
            artist: "a".into(),
            etc: "e".into(),
        };
        let movie = ItemKind::Movie {
            director: "d".into(),
            actor: "x".into(),
        };
        assert_eq!(album.dtype(), "A");
        assert_eq!(movie.dtype(), "M");
    }
}
