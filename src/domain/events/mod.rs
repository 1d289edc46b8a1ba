//! Domain events
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::value_objects::{Money, UserId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, buyer: UserId, seller: UserId, total: Money, item_count: usize },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}

impl OrderEvent {
    pub fn placed(order: &Order) -> Self {
        Self::Placed { order_id: order.id, buyer: order.buyer, seller: order.seller, total: order.total, item_count: order.item_count() }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "orders.placed",
            Self::StatusChanged { .. } => "orders.status_changed",
        }
    }
}
