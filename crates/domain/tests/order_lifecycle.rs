//! Integration tests for the Order aggregate.
//!
//! These tests walk an order from placement through cancellation using only
//! the domain types, with stock kept in a plain item map.

use std::collections::HashMap;

use chrono::Utc;
use common::{DeliveryId, ItemId, MemberId, OrderId, OrderItemId};
use domain::{
    Address, DeliveryStatus, Item, Member, Money, NewDelivery, NewItem, NewMember, NewOrderItem,
    Order, OrderError, OrderStatus, StockError,
};

fn member() -> Member {
    NewMember::new("userA", Address::new("Seoul", "street", "1111")).with_id(MemberId::new(1))
}

fn catalog() -> HashMap<ItemId, Item> {
    [
        NewItem::book("JPA1 BOOK", Money::new(10_000), 100, "kim", "1").with_id(ItemId::new(1)),
        NewItem::book("JPA2 BOOK", Money::new(20_000), 100, "kim", "2").with_id(ItemId::new(2)),
    ]
    .into_iter()
    .map(|item| (item.id, item))
    .collect()
}

/// Places an order for `lines` against `items` and stores it under id 1.
fn place(items: &mut HashMap<ItemId, Item>, lines: &[(i64, u32)]) -> Result<Order, OrderError> {
    let member = member();
    let mut order_items = Vec::new();
    for (id, count) in lines {
        let item = items.get_mut(&ItemId::new(*id)).unwrap();
        let price = item.price;
        order_items.push(NewOrderItem::create(item, price, *count)?);
    }

    let line_ids = (1..=order_items.len() as i64).map(OrderItemId::new).collect();
    let order = Order::create(
        &member,
        NewDelivery::to(member.address.clone()),
        order_items,
        Utc::now(),
    )?
    .with_ids(OrderId::new(1), DeliveryId::new(1), line_ids);
    Ok(order)
}

fn stock(items: &HashMap<ItemId, Item>, id: i64) -> u32 {
    items[&ItemId::new(id)].stock_quantity()
}

mod placing {
    use super::*;

    #[test]
    fn order_takes_stock_and_snapshots_price() {
        let mut items = catalog();
        let order = place(&mut items, &[(1, 1), (2, 2)]).unwrap();

        assert_eq!(order.status(), OrderStatus::Ordered);
        assert_eq!(order.delivery.status, DeliveryStatus::Ready);
        assert_eq!(order.delivery.address.city(), "Seoul");
        assert_eq!(order.total_price(), Money::new(50_000));
        assert_eq!(stock(&items, 1), 99);
        assert_eq!(stock(&items, 2), 98);

        items
            .get_mut(&ItemId::new(2))
            .unwrap()
            .update("JPA2 BOOK", Money::new(99_000), 98);
        assert_eq!(order.order_items[1].order_price, Money::new(20_000));
    }

    #[test]
    fn lines_keep_their_order_ids() {
        let mut items = catalog();
        let order = place(&mut items, &[(2, 1), (1, 1)]).unwrap();

        let ids: Vec<_> = order.order_items.iter().map(|line| line.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(order.order_items.iter().all(|line| line.order_id == order.id));
        assert_eq!(order.item_ids(), vec![ItemId::new(1), ItemId::new(2)]);
    }

    #[test]
    fn empty_order_is_rejected() {
        let mut items = catalog();
        assert_eq!(place(&mut items, &[]).unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn shortage_on_a_line_is_reported() {
        let mut items = catalog();
        let err = place(&mut items, &[(1, 101)]).unwrap_err();

        assert_eq!(
            err,
            OrderError::Stock(StockError::NotEnoughStock {
                item_id: ItemId::new(1),
                requested: 101,
                available: 100,
            })
        );
        assert_eq!(stock(&items, 1), 100);
    }
}

mod cancelling {
    use super::*;

    #[test]
    fn cancel_restores_every_line() {
        let mut items = catalog();
        let mut order = place(&mut items, &[(1, 3), (2, 4), (1, 2)]).unwrap();
        assert_eq!(stock(&items, 1), 95);

        order.cancel(&mut items).unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(stock(&items, 1), 100);
        assert_eq!(stock(&items, 2), 100);
    }

    #[test]
    fn second_cancel_is_rejected_without_restoring_twice() {
        let mut items = catalog();
        let mut order = place(&mut items, &[(1, 3)]).unwrap();
        order.cancel(&mut items).unwrap();

        let err = order.cancel(&mut items).unwrap_err();

        assert_eq!(err, OrderError::AlreadyCancelled { order_id: order.id });
        assert_eq!(stock(&items, 1), 100);
    }

    #[test]
    fn completed_delivery_blocks_cancel() {
        let mut items = catalog();
        let mut order = place(&mut items, &[(1, 3)]).unwrap();
        order.delivery.complete();

        let err = order.cancel(&mut items).unwrap_err();

        assert_eq!(err, OrderError::AlreadyDelivered { order_id: order.id });
        assert_eq!(order.status(), OrderStatus::Ordered);
        assert_eq!(stock(&items, 1), 97);
    }

    #[test]
    fn missing_item_leaves_everything_untouched() {
        let mut items = catalog();
        let mut order = place(&mut items, &[(1, 1), (2, 1)]).unwrap();
        items.remove(&ItemId::new(2));

        let err = order.cancel(&mut items).unwrap_err();

        assert_eq!(
            err,
            OrderError::ItemNotLoaded {
                item_id: ItemId::new(2)
            }
        );
        assert_eq!(order.status(), OrderStatus::Ordered);
        assert_eq!(stock(&items, 1), 99);
    }
}
