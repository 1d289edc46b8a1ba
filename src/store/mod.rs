//! Persistence for catalog, carts, wishlists and orders.
//!
//! Every operation is a single unit of work: the in-memory store holds one
//! lock for its duration, the Postgres store runs it in one transaction.

mod memory;
mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CartLine, Category, Order, OrderStatus, Product, ProductDraft, ProductQuery,
};
use crate::domain::value_objects::{Money, QuantityChange, UserId};
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type SharedStore = Arc<dyn Store>;

pub const PRODUCT_SLUG_FALLBACK: &str = "product";
pub const CATEGORY_SLUG_FALLBACK: &str = "category";

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a category under the first free slug derived from its name.
    async fn insert_category(&self, name: &str) -> Result<Category>;
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn category_by_slug(&self, slug: &str) -> Result<Category>;

    /// Inserts a product under the first free slug derived from its name.
    async fn insert_product(&self, seller: UserId, draft: &ProductDraft, price: Money) -> Result<Product>;
    async fn product(&self, id: Uuid) -> Result<Product>;
    async fn product_by_slug(&self, slug: &str) -> Result<Product>;
    async fn update_product(&self, id: Uuid, draft: &ProductDraft, price: Money) -> Result<Product>;
    /// Deleting a product also drops it from every cart and wishlist.
    async fn delete_product(&self, id: Uuid) -> Result<()>;
    /// Newest first.
    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>>;
    async fn products_by_seller(&self, seller: UserId) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Lines in insertion order. Empty when the user has no cart yet.
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>>;
    /// Creates the cart on demand and merges into an existing (product, size) line.
    async fn add_cart_item(&self, user: UserId, product_id: Uuid, size: Option<String>, qty: u32) -> Result<CartItem>;
    /// `NotFound` when the item is not in this user's cart. `None` when the change removed it.
    async fn update_cart_item(&self, user: UserId, item_id: Uuid, change: QuantityChange) -> Result<Option<CartItem>>;
    async fn remove_cart_item(&self, user: UserId, item_id: Uuid) -> Result<bool>;
    async fn clear_cart(&self, user: UserId) -> Result<()>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn wishlist_products(&self, user: UserId) -> Result<Vec<Product>>;
    async fn add_to_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()>;
    async fn remove_from_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()>;
}

/// A fully priced order plus the cart lines it consumes.
#[derive(Clone, Debug)]
pub struct OrderPlacement {
    pub order: Order,
    pub consumed_cart_items: Vec<Uuid>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically reserves stock, records the order with its items, shipping
    /// address and payment, and removes the consumed cart lines.
    async fn place_order(&self, placement: OrderPlacement) -> Result<Order>;
    async fn order(&self, id: Uuid) -> Result<Order>;
    /// Newest first.
    async fn orders_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>>;
    /// Newest first.
    async fn orders_for_seller(&self, seller: UserId) -> Result<Vec<Order>>;
    /// Applies a validated transition and returns the previous status with the updated order.
    async fn set_order_status(&self, id: Uuid, next: OrderStatus) -> Result<(OrderStatus, Order)>;
}

pub trait Store: CatalogStore + CartStore + WishlistStore + OrderStore {}

impl<T: CatalogStore + CartStore + WishlistStore + OrderStore> Store for T {}
