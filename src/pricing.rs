//! Pricing rules. Every total the storefront shows or records is computed here.
//!
//! Shipping is a single step function: orders at or above
//! [`FREE_SHIPPING_THRESHOLD_CENTS`] ship free, everything else pays
//! [`FLAT_SHIPPING_FEE_CENTS`], and an empty item set pays nothing.

use serde::Serialize;

use crate::domain::aggregates::{CartLine, OrderItem};
use crate::domain::value_objects::Money;

pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 500_00;
pub const FLAT_SHIPPING_FEE_CENTS: i64 = 50_00;

/// Anything with a per-line total.
pub trait Priced {
    fn line_total(&self) -> Money;
}

impl Priced for CartLine {
    fn line_total(&self) -> Money { self.line_total }
}

impl Priced for OrderItem {
    fn line_total(&self) -> Money { self.total_price }
}

pub fn line_total(unit_price: Money, quantity: u32) -> Money {
    unit_price.times(quantity)
}

pub fn subtotal<T: Priced>(items: &[T]) -> Money {
    items.iter().map(Priced::line_total).sum()
}

pub fn shipping_fee(subtotal: Money) -> Money {
    if subtotal >= Money::from_cents(FREE_SHIPPING_THRESHOLD_CENTS) {
        Money::zero()
    } else {
        Money::from_cents(FLAT_SHIPPING_FEE_CENTS)
    }
}

pub fn order_total(subtotal: Money, fee: Money) -> Money {
    subtotal + fee
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
}

impl Totals {
    pub fn of<T: Priced>(items: &[T]) -> Self {
        let subtotal = subtotal(items);
        let shipping = if items.is_empty() { Money::zero() } else { shipping_fee(subtotal) };
        Self { subtotal, shipping, total: order_total(subtotal, shipping) }
    }
}
