//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::{quantity_too_large, Money, QuantityChange, UserId, MAX_QUANTITY};
use crate::ShopError;

/// One cart per user, created on the first mutation and reused after checkout.
#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    user: UserId,
    is_active: bool,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored cart row. Identity within a cart is (product, size).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cart row joined with the live product it points at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub seller: UserId,
    pub unit_price: Money,
    pub quantity: u32,
    pub size: Option<String>,
    pub line_total: Money,
}

impl CartLine {
    pub fn new(item: &CartItem, product: &Product) -> Self {
        Self::from_parts(item.id, item.product_id, product.name.clone(), product.seller, product.price, item.quantity, item.size.clone())
    }

    pub fn from_parts(
        id: Uuid, product_id: Uuid, product_name: String, seller: UserId, unit_price: Money, quantity: u32, size: Option<String>,
    ) -> Self {
        let line_total = crate::pricing::line_total(unit_price, quantity);
        Self { id, product_id, product_name, seller, unit_price, quantity, size, line_total }
    }
}

pub const MAX_SIZE_LEN: usize = 10;

/// Blank sizes mean "no size" so they merge with size-less lines.
pub fn normalize_size(size: Option<String>) -> Option<String> {
    size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Normalizes a requested size and rejects labels longer than [`MAX_SIZE_LEN`] characters.
pub fn check_size(size: Option<String>) -> Result<Option<String>, ShopError> {
    let size = normalize_size(size);
    match &size {
        Some(s) if s.chars().count() > MAX_SIZE_LEN => {
            Err(ShopError::Validation(format!("size must be at most {MAX_SIZE_LEN} characters")))
        }
        _ => Ok(size),
    }
}

impl Cart {
    pub fn for_user(user: UserId) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), user, is_active: true, items: vec![], created_at: now, updated_at: now }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user(&self) -> UserId { self.user }
    pub fn is_active(&self) -> bool { self.is_active }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Adds `qty` of a product. An existing (product, size) line is incremented instead of duplicated.
    pub fn add_item(&mut self, product_id: Uuid, size: Option<String>, qty: u32) -> Result<CartItem, ShopError> {
        let size = check_size(size)?;
        if qty > MAX_QUANTITY { return Err(quantity_too_large()); }
        let item = if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id && i.size == size) {
            existing.quantity = existing.quantity.checked_add(qty).filter(|q| *q <= MAX_QUANTITY).ok_or_else(quantity_too_large)?;
            existing.clone()
        } else {
            let item = CartItem { id: Uuid::now_v7(), cart_id: self.id, product_id, quantity: qty, size, created_at: Utc::now() };
            self.items.push(item.clone());
            item
        };
        self.touch();
        Ok(item)
    }

    /// Returns the updated line, or `None` when the change removed it.
    pub fn update_quantity(&mut self, item_id: Uuid, change: QuantityChange) -> Result<Option<CartItem>, ShopError> {
        let item = self.items.iter_mut().find(|i| i.id == item_id).ok_or(ShopError::NotFound("cart item"))?;
        let updated = match change {
            QuantityChange::Set(qty) => {
                item.quantity = qty;
                Some(item.clone())
            }
            QuantityChange::Remove => {
                self.items.retain(|i| i.id != item_id);
                None
            }
        };
        self.touch();
        Ok(updated)
    }

    /// Returns whether a line was removed. Removing an absent line is a no-op.
    pub fn remove_item(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        let removed = self.items.len() != before;
        if removed { self.touch(); }
        removed
    }

    pub fn remove_product(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Drops only the given lines, leaving anything added concurrently.
    pub fn consume(&mut self, item_ids: &[Uuid]) {
        self.items.retain(|i| !item_ids.contains(&i.id));
        self.touch();
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::for_user(UserId::generate());
        let p1 = Uuid::now_v7();
        cart.add_item(p1, Some("M".into()), 1).unwrap();
        cart.add_item(p1, Some(" M ".into()), 1).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2); // Merged

        cart.add_item(p1, Some("L".into()), 1).unwrap();
        cart.add_item(p1, Some("".into()), 4).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.items()[2].size, None);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::for_user(UserId::generate());
        let item = cart.add_item(Uuid::now_v7(), None, 1).unwrap();

        let updated = cart.update_quantity(item.id, QuantityChange::Set(5)).unwrap();
        assert_eq!(updated.map(|i| i.quantity), Some(5));

        assert_eq!(cart.update_quantity(item.id, QuantityChange::Remove).unwrap(), None);
        assert!(cart.is_empty());

        assert!(matches!(cart.update_quantity(item.id, QuantityChange::Set(1)), Err(ShopError::NotFound(_))));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::for_user(UserId::generate());
        let item = cart.add_item(Uuid::now_v7(), None, 1).unwrap();
        assert!(cart.remove_item(item.id));
        assert!(!cart.remove_item(item.id));
    }

    #[test]
    fn test_consume_keeps_other_lines() {
        let mut cart = Cart::for_user(UserId::generate());
        let a = cart.add_item(Uuid::now_v7(), None, 1).unwrap();
        let b = cart.add_item(Uuid::now_v7(), None, 1).unwrap();
        cart.consume(&[a.id]);
        assert_eq!(cart.items(), &[b]);
    }

    #[test]
    fn test_merged_quantity_is_bounded() {
        let mut cart = Cart::for_user(UserId::generate());
        let p1 = Uuid::now_v7();
        cart.add_item(p1, Some("M".into()), MAX_QUANTITY).unwrap();

        let result = cart.add_item(p1, Some("M".into()), 1);
        assert!(matches!(result, Err(ShopError::Validation(_))), "expected Validation, got {result:?}");
        assert_eq!(cart.items()[0].quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_size_length() {
        assert_eq!(check_size(Some(" XXXXXXXXXL ".into())).unwrap().as_deref(), Some("XXXXXXXXXL"));
        assert_eq!(check_size(Some("   ".into())).unwrap(), None);
        assert!(matches!(check_size(Some("XXXXXXXXXXL".into())), Err(ShopError::Validation(_))));

        let mut cart = Cart::for_user(UserId::generate());
        assert!(cart.add_item(Uuid::now_v7(), Some("XXXXXXXXXXL".into()), 1).is_err());
        assert!(cart.is_empty());
    }
}
