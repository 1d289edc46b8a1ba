//! Route handlers. Each one resolves the caller, delegates to a service and
//! serializes the result.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{
    extract::{JsonBody, PathParam, QueryParams},
    identity::CurrentUser,
    AppState,
};
use crate::domain::aggregates::{NewCategory, OrderStatus, ProductDraft, ProductQuery};
use crate::services::{CheckoutForm, CheckoutSource};
use crate::Result;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy", "service": "opensase-storefront" }))
}

// Catalog

pub async fn list_categories(State(s): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(s.catalog.list_categories().await?))
}

pub async fn create_category(State(s): State<AppState>, _user: CurrentUser, JsonBody(body): JsonBody<NewCategory>) -> Result<impl IntoResponse> {
    Ok((StatusCode::CREATED, Json(s.catalog.create_category(body).await?)))
}

pub async fn list_products(State(s): State<AppState>, QueryParams(q): QueryParams<ProductQuery>) -> Result<impl IntoResponse> {
    Ok(Json(s.catalog.search(&q).await?))
}

pub async fn create_product(State(s): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(body): JsonBody<ProductDraft>) -> Result<impl IntoResponse> {
    Ok((StatusCode::CREATED, Json(s.catalog.create_product(user, body).await?)))
}

pub async fn get_product(State(s): State<AppState>, PathParam(id): PathParam<Uuid>) -> Result<impl IntoResponse> {
    Ok(Json(s.catalog.get_product(id).await?))
}

pub async fn get_product_by_slug(State(s): State<AppState>, PathParam(slug): PathParam<String>) -> Result<impl IntoResponse> {
    Ok(Json(s.catalog.get_product_by_slug(&slug).await?))
}

pub async fn update_product(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(id): PathParam<Uuid>, JsonBody(body): JsonBody<ProductDraft>) -> Result<impl IntoResponse> {
    Ok(Json(s.catalog.update_product(user, id, body).await?))
}

pub async fn delete_product(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(id): PathParam<Uuid>) -> Result<impl IntoResponse> {
    s.catalog.delete_product(user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Cart

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 { 1 }

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest { pub item_id: Uuid, pub quantity: i64 }

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest { pub item_id: Uuid }

pub async fn get_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(s.carts.summary(user).await?))
}

pub async fn clear_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    s.carts.clear(user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_cart_item(State(s): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(body): JsonBody<AddItemRequest>) -> Result<impl IntoResponse> {
    let item = s.carts.add(user, body.product_id, body.size, body.quantity).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_cart_item(State(s): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(body): JsonBody<UpdateItemRequest>) -> Result<impl IntoResponse> {
    Ok(Json(s.carts.update_quantity(user, body.item_id, body.quantity).await?))
}

pub async fn remove_cart_item(State(s): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(body): JsonBody<RemoveItemRequest>) -> Result<impl IntoResponse> {
    Ok(Json(s.carts.remove(user, body.item_id).await?))
}

// Checkout

#[derive(Debug, Default, Deserialize)]
pub struct SizeParam { pub size: Option<String> }

pub async fn quote_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(s.checkout.quote(user, CheckoutSource::Cart).await?))
}

pub async fn checkout_cart(State(s): State<AppState>, CurrentUser(user): CurrentUser, JsonBody(form): JsonBody<CheckoutForm>) -> Result<impl IntoResponse> {
    let order_id = s.checkout.place(user, CheckoutSource::Cart, form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order_id": order_id }))))
}

pub async fn quote_product(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(product_id): PathParam<Uuid>, QueryParams(p): QueryParams<SizeParam>) -> Result<impl IntoResponse> {
    Ok(Json(s.checkout.quote(user, CheckoutSource::Product { product_id, size: p.size }).await?))
}

pub async fn checkout_product(
    State(s): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(product_id): PathParam<Uuid>,
    QueryParams(p): QueryParams<SizeParam>,
    JsonBody(form): JsonBody<CheckoutForm>,
) -> Result<impl IntoResponse> {
    let order_id = s.checkout.place(user, CheckoutSource::Product { product_id, size: p.size }, form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order_id": order_id }))))
}

// Orders

#[derive(Debug, Deserialize)]
pub struct StatusRequest { pub status: OrderStatus }

pub async fn list_orders(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(s.orders.list_for_user(user).await?))
}

pub async fn get_order(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(id): PathParam<Uuid>) -> Result<impl IntoResponse> {
    Ok(Json(s.orders.get(id, user).await?))
}

pub async fn advance_order(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(id): PathParam<Uuid>, JsonBody(body): JsonBody<StatusRequest>) -> Result<impl IntoResponse> {
    Ok(Json(s.orders.advance_status(user, id, body.status).await?))
}

pub async fn seller_dashboard(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(s.orders.seller_dashboard(user).await?))
}

// Wishlist

pub async fn get_wishlist(State(s): State<AppState>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse> {
    Ok(Json(s.wishlist.list(user).await?))
}

pub async fn add_to_wishlist(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(product_id): PathParam<Uuid>) -> Result<impl IntoResponse> {
    s.wishlist.add(user, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_from_wishlist(State(s): State<AppState>, CurrentUser(user): CurrentUser, PathParam(product_id): PathParam<Uuid>) -> Result<impl IntoResponse> {
    s.wishlist.remove(user, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
