//! Response shapes produced by the read strategies.
//!
//! `OrderDto`/`OrderItemDto` are built from loaded entities; the `*QueryDto`
//! shapes come straight from projection queries. Both serialize to the same
//! JSON so callers cannot tell which strategy produced a response.

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Address, Money, OrderStatus};
use serde::Serialize;
use store::{OrderFlatRow, OrderItemQueryRow, OrderQueryRow};

/// An order with its member name, delivery address and lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemDto>,
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemDto {
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}

/// An order header read directly from a projection query, with its lines
/// filled in by a second step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQueryDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemQueryDto>,
}

/// An order line read directly from a projection query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemQueryDto {
    /// Grouping key; already present on the parent.
    #[serde(skip)]
    pub order_id: OrderId,
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}

/// Header and one line of an order in a single flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderFlatDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: String,
    pub order_price: Money,
    pub count: u32,
}

/// An order without its lines, built from loaded entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleOrderDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

/// An order without its lines, read directly from a projection query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSimpleQueryDto {
    pub order_id: OrderId,
    pub name: String,
    pub order_date: DateTime<Utc>,
    pub order_status: OrderStatus,
    pub address: Address,
}

impl OrderQueryDto {
    /// Header without lines.
    pub fn header(row: OrderQueryRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
            order_items: Vec::new(),
        }
    }
}

impl From<OrderItemQueryRow> for OrderItemQueryDto {
    fn from(row: OrderItemQueryRow) -> Self {
        Self {
            order_id: row.order_id,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

impl From<OrderFlatRow> for OrderFlatDto {
    fn from(row: OrderFlatRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
            item_name: row.item_name,
            order_price: row.order_price,
            count: row.count,
        }
    }
}

impl OrderFlatDto {
    /// Splits the record into its header (without lines) and its line.
    pub fn split(self) -> (OrderQueryDto, OrderItemQueryDto) {
        (
            OrderQueryDto {
                order_id: self.order_id,
                name: self.name,
                order_date: self.order_date,
                order_status: self.order_status,
                address: self.address,
                order_items: Vec::new(),
            },
            OrderItemQueryDto {
                order_id: self.order_id,
                item_name: self.item_name,
                order_price: self.order_price,
                count: self.count,
            },
        )
    }
}

impl From<OrderItemQueryDto> for OrderItemDto {
    fn from(line: OrderItemQueryDto) -> Self {
        Self {
            item_name: line.item_name,
            order_price: line.order_price,
            count: line.count,
        }
    }
}

impl From<OrderQueryDto> for OrderDto {
    fn from(dto: OrderQueryDto) -> Self {
        Self {
            order_id: dto.order_id,
            name: dto.name,
            order_date: dto.order_date,
            order_status: dto.order_status,
            address: dto.address,
            order_items: dto.order_items.into_iter().map(OrderItemDto::from).collect(),
        }
    }
}

impl From<OrderQueryRow> for OrderSimpleQueryDto {
    fn from(row: OrderQueryRow) -> Self {
        Self {
            order_id: row.order_id,
            name: row.name,
            order_date: row.order_date,
            order_status: row.order_status,
            address: row.address,
        }
    }
}

impl From<OrderSimpleQueryDto> for SimpleOrderDto {
    fn from(dto: OrderSimpleQueryDto) -> Self {
        Self {
            order_id: dto.order_id,
            name: dto.name,
            order_date: dto.order_date,
            order_status: dto.order_status,
            address: dto.address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(item_name: &str) -> OrderFlatDto {
        OrderFlatDto {
            order_id: OrderId::new(7),
            name: "kim".to_string(),
            order_date: DateTime::<Utc>::UNIX_EPOCH,
            order_status: OrderStatus::Ordered,
            address: Address::new("Seoul", "1", "111"),
            item_name: item_name.to_string(),
            order_price: Money::new(1000),
            count: 2,
        }
    }

    #[test]
    fn query_line_hides_order_id() {
        let (_, line) = flat("JPA1").split();
        let json = serde_json::to_value(&line).unwrap();

        assert!(json.get("order_id").is_none());
        assert_eq!(json["item_name"], "JPA1");
        assert_eq!(json["order_price"], 1000);
    }

    #[test]
    fn query_dto_and_entity_dto_serialize_alike() {
        let (mut header, line) = flat("JPA1").split();
        header.order_items.push(line);
        let entity_dto = OrderDto::from(header.clone());

        assert_eq!(
            serde_json::to_value(&header).unwrap(),
            serde_json::to_value(&entity_dto).unwrap()
        );
    }

    #[test]
    fn status_serializes_uppercase() {
        let (header, _) = flat("JPA1").split();
        let json = serde_json::to_value(SimpleOrderDto {
            order_id: header.order_id,
            name: header.name,
            order_date: header.order_date,
            order_status: OrderStatus::Cancelled,
            address: header.address,
        })
        .unwrap();
        assert_eq!(json["order_status"], "CANCELLED");
    }
}
