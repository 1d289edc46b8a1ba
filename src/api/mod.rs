//! JSON HTTP surface.

mod error;
mod extract;
mod handlers;
pub mod identity;

use axum::{routing::{get, post}, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::publisher::EventPublisher;
use crate::services::{CartService, CatalogService, CheckoutService, OrderService, WishlistService};
use crate::store::SharedStore;
use handlers::*;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub wishlist: WishlistService,
}

impl AppState {
    pub fn new(store: SharedStore, publisher: EventPublisher) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone(), publisher.clone()),
            orders: OrderService::new(store.clone(), publisher),
            wishlist: WishlistService::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/api/v1/products/slug/:slug", get(get_product_by_slug))
        .route("/api/v1/cart", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/items", post(add_cart_item))
        .route("/api/v1/cart/update", post(update_cart_item))
        .route("/api/v1/cart/remove", post(remove_cart_item))
        .route("/api/v1/checkout", get(quote_cart).post(checkout_cart))
        .route("/api/v1/checkout/:product_id", get(quote_product).post(checkout_product))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/:id", get(get_order))
        .route("/api/v1/orders/:id/status", post(advance_order))
        .route("/api/v1/wishlist", get(get_wishlist))
        .route("/api/v1/wishlist/:product_id", post(add_to_wishlist).delete(remove_from_wishlist))
        .route("/api/v1/seller/dashboard", get(seller_dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
