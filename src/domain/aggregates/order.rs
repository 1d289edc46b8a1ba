//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::CartLine;
use crate::domain::value_objects::{Money, UserId};
use crate::pricing::Totals;
use crate::ShopError;

/// Placed order. Everything except `status` is fixed at placement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer: UserId,
    pub seller: UserId,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub shipping_address: Option<ShippingAddress>,
    pub payment: Option<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Purchased line with the unit price captured at placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub size: Option<String>,
    pub total_price: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[validate(length(min = 1, max = 50))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub zip_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn pending(method: PaymentMethod) -> Self {
        Self { method, status: PaymentStatus::Pending, transaction_id: None, created_at: Utc::now() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus { Pending, Paid, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { Cod, Card }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus { Pending, Completed, Failed }

#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError { kind: &'static str, value: String }

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!((self, next), (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Paid, Cancelled) | (Shipped, Delivered))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError { kind: "order status", value: s.to_string() }),
        }
    }
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str { match self { Self::Cod => "cod", Self::Card => "card" } }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "card" => Ok(Self::Card),
            _ => Err(ParseEnumError { kind: "payment method", value: s.to_string() }),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self { Self::Pending => "Pending", Self::Completed => "Completed", Self::Failed => "Failed" }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            _ => Err(ParseEnumError { kind: "payment status", value: s.to_string() }),
        }
    }
}

impl OrderItem {
    pub fn new(product_id: Uuid, product_name: String, quantity: u32, unit_price: Money, size: Option<String>) -> Self {
        Self::restore(Uuid::now_v7(), product_id, product_name, quantity, unit_price, size)
    }

    pub fn restore(id: Uuid, product_id: Uuid, product_name: String, quantity: u32, unit_price: Money, size: Option<String>) -> Self {
        let total_price = crate::pricing::line_total(unit_price, quantity);
        Self { id, product_id, product_name, quantity, unit_price, size, total_price }
    }

    pub fn from_line(line: &CartLine) -> Self {
        Self::new(line.product_id, line.product_name.clone(), line.quantity, line.unit_price, line.size.clone())
    }
}

impl Order {
    /// Builds a pending order and its server-side totals from resolved lines.
    pub fn place(
        buyer: UserId,
        lines: &[CartLine],
        shipping_address: ShippingAddress,
        payment: Payment,
    ) -> Result<Self, ShopError> {
        let first = lines.first().ok_or(ShopError::EmptyCart)?;
        if lines.iter().any(|l| l.seller != first.seller) { return Err(ShopError::SellerMismatch); }

        let items: Vec<OrderItem> = lines.iter().map(OrderItem::from_line).collect();
        let totals = Totals::of(&items);
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), buyer, seller: first.seller, status: OrderStatus::Pending, items,
            subtotal: totals.subtotal, shipping_fee: totals.shipping, total: totals.total,
            shipping_address: Some(shipping_address), payment: Some(payment), created_at: now, updated_at: now,
        })
    }

    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_visible_to(&self, user: UserId) -> bool { self.buyer == user }

    pub fn advance(&mut self, next: OrderStatus) -> Result<(), ShopError> {
        if !self.status.can_transition_to(next) {
            return Err(ShopError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
