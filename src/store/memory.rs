//! In-memory store, used for local development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::aggregates::{
    Cart, CartItem, CartLine, Category, Order, OrderStatus, Product, ProductDraft, ProductQuery, Wishlist,
};
use crate::domain::value_objects::{slug_base, unique_slug, Money, QuantityChange, UserId};
use crate::store::{
    CartStore, CatalogStore, OrderPlacement, OrderStore, WishlistStore, CATEGORY_SLUG_FALLBACK, PRODUCT_SLUG_FALLBACK,
};
use crate::{Result, ShopError};

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: HashMap<UserId, Cart>,
    wishlists: HashMap<UserId, Wishlist>,
    orders: Vec<Order>,
}

impl State {
    fn product(&self, id: Uuid) -> Result<&Product> {
        self.products.iter().find(|p| p.id == id).ok_or(ShopError::NotFound("product"))
    }

    fn product_mut(&mut self, id: Uuid) -> Result<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id).ok_or(ShopError::NotFound("product"))
    }

    fn order_mut(&mut self, id: Uuid) -> Result<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id).ok_or(ShopError::NotFound("order"))
    }

    fn cart_lines(&self, user: UserId) -> Vec<CartLine> {
        let Some(cart) = self.carts.get(&user) else { return vec![] };
        cart.items()
            .iter()
            .filter_map(|item| self.product(item.product_id).ok().map(|p| CartLine::new(item, p)))
            .collect()
    }

    fn newest_orders(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.iter().rev().filter(|o| keep(*o)).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

/// Store backed by a single mutex-guarded state.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_category(&self, name: &str) -> Result<Category> {
        let mut state = self.state.lock().await;
        let base = slug_base(name, CATEGORY_SLUG_FALLBACK);
        let slug = unique_slug(&base, |s| state.categories.iter().any(|c| c.slug == s));
        let category = Category::create(name.trim(), slug);
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Category> {
        let state = self.state.lock().await;
        state.categories.iter().find(|c| c.slug == slug).cloned().ok_or(ShopError::NotFound("category"))
    }

    async fn insert_product(&self, seller: UserId, draft: &ProductDraft, price: Money) -> Result<Product> {
        let mut state = self.state.lock().await;
        if let Some(category) = draft.category_id {
            if !state.categories.iter().any(|c| c.id == category) { return Err(ShopError::NotFound("category")); }
        }
        let base = slug_base(&draft.name, PRODUCT_SLUG_FALLBACK);
        let slug = unique_slug(&base, |s| state.products.iter().any(|p| p.slug == s));
        let product = Product::create(seller, draft, price, slug);
        state.products.push(product.clone());
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        self.state.lock().await.product(id).cloned()
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Product> {
        let state = self.state.lock().await;
        state.products.iter().find(|p| p.slug == slug).cloned().ok_or(ShopError::NotFound("product"))
    }

    async fn update_product(&self, id: Uuid, draft: &ProductDraft, price: Money) -> Result<Product> {
        let mut state = self.state.lock().await;
        if let Some(category) = draft.category_id {
            if !state.categories.iter().any(|c| c.id == category) { return Err(ShopError::NotFound("category")); }
        }
        let product = state.product_mut(id)?;
        product.apply(draft, price);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.product(id)?;
        state.products.retain(|p| p.id != id);
        for cart in state.carts.values_mut() { cart.remove_product(id); }
        for wishlist in state.wishlists.values_mut() { wishlist.remove(id); }
        Ok(())
    }

    async fn search_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        let category = match query.category.as_deref() {
            Some(slug) => Some(state.categories.iter().find(|c| c.slug == slug).ok_or(ShopError::NotFound("category"))?.id),
            None => None,
        };
        let term = query.search_term();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .rev()
            .filter(|p| category.map_or(true, |c| p.category_id == Some(c)))
            .filter(|p| term.as_deref().map_or(true, |t| p.matches(t)))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn products_by_seller(&self, seller: UserId) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.iter().filter(|p| p.is_sold_by(seller)).cloned().collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>> {
        Ok(self.state.lock().await.cart_lines(user))
    }

    async fn add_cart_item(&self, user: UserId, product_id: Uuid, size: Option<String>, qty: u32) -> Result<CartItem> {
        let mut state = self.state.lock().await;
        state.product(product_id)?;
        let cart = state.carts.entry(user).or_insert_with(|| Cart::for_user(user));
        cart.add_item(product_id, size, qty)
    }

    async fn update_cart_item(&self, user: UserId, item_id: Uuid, change: QuantityChange) -> Result<Option<CartItem>> {
        let mut state = self.state.lock().await;
        let cart = state.carts.get_mut(&user).ok_or(ShopError::NotFound("cart item"))?;
        cart.update_quantity(item_id, change)
    }

    async fn remove_cart_item(&self, user: UserId, item_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.carts.get_mut(&user).map_or(false, |cart| cart.remove_item(item_id)))
    }

    async fn clear_cart(&self, user: UserId) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(cart) = state.carts.get_mut(&user) { cart.clear(); }
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn wishlist_products(&self, user: UserId) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        let Some(wishlist) = state.wishlists.get(&user) else { return Ok(vec![]) };
        Ok(wishlist.product_ids().iter().filter_map(|id| state.product(*id).ok().cloned()).collect())
    }

    async fn add_to_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.product(product_id)?;
        state.wishlists.entry(user).or_insert_with(|| Wishlist::for_user(user)).add(product_id);
        Ok(())
    }

    async fn remove_from_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(wishlist) = state.wishlists.get_mut(&user) {
            wishlist.remove(product_id);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, placement: OrderPlacement) -> Result<Order> {
        let mut state = self.state.lock().await;
        let OrderPlacement { order, consumed_cart_items } = placement;

        // Check every line before touching anything so a failure leaves no trace.
        let mut required: HashMap<Uuid, u32> = HashMap::new();
        for item in &order.items {
            let total = required.entry(item.product_id).or_default();
            *total = total.checked_add(item.quantity).ok_or_else(|| ShopError::InsufficientStock(item.product_name.clone()))?;
        }
        for (product_id, qty) in &required {
            let product = state.product(*product_id)?;
            if !product.has_stock(*qty) { return Err(ShopError::InsufficientStock(product.name.clone())); }
        }

        for (product_id, qty) in required {
            state.product_mut(product_id)?.record_sale(qty)?;
        }
        if let Some(cart) = state.carts.get_mut(&order.buyer) { cart.consume(&consumed_cart_items); }
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn order(&self, id: Uuid) -> Result<Order> {
        let state = self.state.lock().await;
        state.orders.iter().find(|o| o.id == id).cloned().ok_or(ShopError::NotFound("order"))
    }

    async fn orders_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>> {
        Ok(self.state.lock().await.newest_orders(|o| o.buyer == buyer))
    }

    async fn orders_for_seller(&self, seller: UserId) -> Result<Vec<Order>> {
        Ok(self.state.lock().await.newest_orders(|o| o.seller == seller))
    }

    async fn set_order_status(&self, id: Uuid, next: OrderStatus) -> Result<(OrderStatus, Order)> {
        let mut state = self.state.lock().await;
        let order = state.order_mut(id)?;
        let previous = order.status;
        order.advance(next)?;
        Ok((previous, order.clone()))
    }
}
