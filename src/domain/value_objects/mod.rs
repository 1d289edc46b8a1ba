//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, iter::Sum, ops::Add, str::FromStr};
use uuid::Uuid;

use crate::ShopError;

/// Authenticated user identity as handed over by the session layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn generate() -> Self { Self(Uuid::now_v7()) }
    pub fn from_uuid(id: Uuid) -> Self { Self(id) }
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for UserId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

/// Money value object. Always carries exactly two decimal places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self {
        let mut amount = amount;
        amount.rescale(2);
        Self(amount)
    }
    pub fn zero() -> Self { Self::new(Decimal::ZERO) }
    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
    pub fn is_negative(&self) -> bool { self.0.is_sign_negative() && !self.0.is_zero() }
    pub fn times(&self, qty: u32) -> Money { Money::new(self.0 * Decimal::from(qty)) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, other: Money) -> Money { Money::new(self.0 + other.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self { iter.fold(Money::zero(), Add::add) }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self { iter.copied().sum() }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Largest storable price: ten digits, two of them after the point.
pub const MAX_PRICE_CENTS: i64 = 99_999_999_99;

/// Largest quantity a cart or order line may hold.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Checks a user-supplied price: non-negative, at most [`MAX_PRICE_CENTS`] and two decimal places.
pub fn parse_price(amount: Decimal) -> Result<Money, ShopError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ShopError::Validation("price must not be negative".into()));
    }
    if amount > Decimal::new(MAX_PRICE_CENTS, 2) {
        return Err(ShopError::Validation("price must not exceed 99999999.99".into()));
    }
    if amount.normalize().scale() > 2 {
        return Err(ShopError::Validation("price must have at most two decimal places".into()));
    }
    Ok(Money::new(amount))
}

/// Quantity requested when adding to a cart. Must be between one and [`MAX_QUANTITY`].
pub fn requested_quantity(qty: i64) -> Result<u32, ShopError> {
    if qty < 1 { return Err(ShopError::Validation("quantity must be at least 1".into())); }
    u32::try_from(qty).ok().filter(|q| *q <= MAX_QUANTITY).ok_or_else(quantity_too_large)
}

pub fn quantity_too_large() -> ShopError {
    ShopError::Validation(format!("quantity must not exceed {MAX_QUANTITY}"))
}

/// What an update request does to an existing cart line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityChange {
    Set(u32),
    Remove,
}

impl QuantityChange {
    /// Zero or negative quantities remove the line instead of storing it.
    pub fn from_requested(qty: i64) -> Result<Self, ShopError> {
        if qty <= 0 { Ok(Self::Remove) } else { requested_quantity(qty).map(Self::Set) }
    }
}

/// Lowercase, hyphen-separated, URL-safe form of a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() { slug.push('-'); }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    slug
}

/// Slug base for a name, falling back when the name has no usable characters.
pub fn slug_base(name: &str, fallback: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() { fallback.to_string() } else { slug }
}

/// First of `base`, `base-1`, `base-2`, ... for which `taken` is false.
pub fn unique_slug(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    let mut slug = base.to_string();
    let mut num = 1;
    while taken(&slug) {
        slug = format!("{base}-{num}");
        num += 1;
    }
    slug
}
