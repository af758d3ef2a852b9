//! Delivery owned by an order.

use common::DeliveryId;
use serde::{Deserialize, Serialize};

use crate::Address;

/// Shipping progress of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    /// Waiting to ship.
    #[default]
    Ready,
    /// Delivered (terminal).
    Comp,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Ready => "READY",
            DeliveryStatus::Comp => "COMP",
        }
    }

    /// Parses the stored column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "READY" => Some(DeliveryStatus::Ready),
            "COMP" => Some(DeliveryStatus::Comp),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub address: Address,
    pub status: DeliveryStatus,
}

impl Delivery {
    /// Marks the delivery as completed.
    pub fn complete(&mut self) {
        self.status = DeliveryStatus::Comp;
    }

    pub fn is_completed(&self) -> bool {
        self.status == DeliveryStatus::Comp
    }
}

/// A delivery created together with its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDelivery {
    pub address: Address,
    pub status: DeliveryStatus,
}

impl NewDelivery {
    /// A ready-to-ship delivery to the given address.
    pub fn to(address: Address) -> Self {
        Self {
            address,
            status: DeliveryStatus::Ready,
        }
    }

    /// Attaches the storage key assigned on insert.
    pub fn with_id(self, id: DeliveryId) -> Delivery {
        Delivery {
            id,
            address: self.address,
            status: self.status,
        }
    }
}
