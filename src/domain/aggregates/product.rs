//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{parse_price, Money, UserId};
use crate::ShopError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), slug: slug.into(), created_at: Utc::now() }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub seller: UserId,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub sold: u32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seller-submitted product fields, used for both creation and edits.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_featured: bool,
}

impl ProductDraft {
    /// Validates the draft and returns the normalized price.
    pub fn check(&self) -> Result<Money, ShopError> {
        self.validate()?;
        if self.name.trim().is_empty() { return Err(ShopError::Validation("name must not be blank".into())); }
        parse_price(self.price)
    }
}

/// Catalog listing filter. Both fields are optional and combine with AND.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ProductQuery {
    pub fn search_term(&self) -> Option<String> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
    }
}

impl Product {
    pub fn create(seller: UserId, draft: &ProductDraft, price: Money, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), seller, category_id: draft.category_id, name: draft.name.trim().to_string(),
            slug: slug.into(), description: draft.description.clone(), price, stock: draft.stock, sold: 0,
            is_featured: draft.is_featured, created_at: now, updated_at: now,
        }
    }

    pub fn is_sold_by(&self, user: UserId) -> bool { self.seller == user }
    pub fn has_stock(&self, qty: u32) -> bool { self.stock >= qty }

    /// Applies an edit. The slug stays stable so existing links keep working.
    pub fn apply(&mut self, draft: &ProductDraft, price: Money) {
        self.name = draft.name.trim().to_string();
        self.description = draft.description.clone();
        self.price = price;
        self.stock = draft.stock;
        self.category_id = draft.category_id;
        self.is_featured = draft.is_featured;
        self.touch();
    }

    pub fn record_sale(&mut self, qty: u32) -> Result<(), ShopError> {
        if !self.has_stock(qty) { return Err(ShopError::InsufficientStock(self.name.clone())); }
        self.stock -= qty;
        self.sold = self.sold.saturating_add(qty);
        self.touch();
        Ok(())
    }

    pub fn matches(&self, term: &str) -> bool { self.name.to_lowercase().contains(term) }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(price: Decimal) -> ProductDraft {
        ProductDraft { name: " Linen Shirt ".into(), description: None, price, stock: 5, category_id: None, is_featured: false }
    }

    #[test]
    fn test_product_create() {
        let d = draft(Decimal::new(1999, 2));
        let price = d.check().unwrap();
        let p = Product::create(UserId::generate(), &d, price, "linen-shirt");
        assert_eq!(p.name, "Linen Shirt");
        assert_eq!(p.price.to_string(), "19.99");
        assert_eq!(p.sold, 0);
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        assert!(matches!(draft(Decimal::new(-100, 2)).check(), Err(ShopError::Validation(_))));
        let mut d = draft(Decimal::ONE);
        d.name = String::new();
        assert!(matches!(d.check(), Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_record_sale() {
        let d = draft(Decimal::ONE);
        let mut p = Product::create(UserId::generate(), &d, Money::from_cents(100), "p");
        p.record_sale(3).unwrap();
        assert_eq!((p.stock, p.sold), (2, 3));
        assert!(matches!(p.record_sale(3), Err(ShopError::InsufficientStock(_))));
        assert_eq!(p.stock, 2);
    }

    #[test]
    fn test_search_term_normalized() {
        let q = ProductQuery { search: Some("  ShIrT ".into()), category: None };
        assert_eq!(q.search_term().as_deref(), Some("shirt"));
        assert_eq!(ProductQuery::default().search_term(), None);
    }
}
