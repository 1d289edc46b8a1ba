//! Postgres store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, query, query_as, query_scalar, FromRow, PgConnection, PgPool, Row};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::{
    CartItem, CartLine, Category, Order, OrderItem, OrderStatus, Payment, Product, ProductDraft, ProductQuery,
    ShippingAddress,
};
use crate::domain::value_objects::{slug_base, unique_slug, Money, QuantityChange, UserId};
use crate::store::{
    CartStore, CatalogStore, OrderPlacement, OrderStore, WishlistStore, CATEGORY_SLUG_FALLBACK, PRODUCT_SLUG_FALLBACK,
};
use crate::{Result, ShopError};

const PRODUCT_COLUMNS: &str =
    "id, seller_id, category_id, name, slug, description, price, stock, sold, is_featured, created_at, updated_at";
const CART_ITEM_COLUMNS: &str = "ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.size, ci.created_at";
const ORDER_COLUMNS: &str = "id, buyer_id, seller_id, status, subtotal, shipping_fee, total, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn try_get_u32(row: &PgRow, col: &str) -> sqlx::Result<u32> {
    let value: i32 = row.try_get(col)?;
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode { index: col.to_string(), source: Box::new(e) })
}

fn try_get_money(row: &PgRow, col: &str) -> sqlx::Result<Money> {
    row.try_get::<Decimal, _>(col).map(Money::new)
}

fn try_parse<T>(row: &PgRow, col: &str) -> sqlx::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.try_get(col)?;
    value.parse().map_err(|e: T::Err| sqlx::Error::ColumnDecode { index: col.to_string(), source: Box::new(e) })
}

fn to_i32(qty: u32) -> Result<i32> {
    i32::try_from(qty).map_err(|_| ShopError::Validation("quantity too large".into()))
}

impl<'r> FromRow<'r, PgRow> for Category {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self { id: row.try_get("id")?, name: row.try_get("name")?, slug: row.try_get("slug")?, created_at: row.try_get("created_at")? })
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            seller: UserId::from_uuid(row.try_get("seller_id")?),
            category_id: row.try_get("category_id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            price: try_get_money(row, "price")?,
            stock: try_get_u32(row, "stock")?,
            sold: try_get_u32(row, "sold")?,
            is_featured: row.try_get("is_featured")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            cart_id: row.try_get("cart_id")?,
            product_id: row.try_get("product_id")?,
            quantity: try_get_u32(row, "quantity")?,
            size: row.try_get("size")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self::from_parts(
            row.try_get("id")?,
            row.try_get("product_id")?,
            row.try_get("product_name")?,
            UserId::from_uuid(row.try_get("seller_id")?),
            try_get_money(row, "price")?,
            try_get_u32(row, "quantity")?,
            row.try_get("size")?,
        ))
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self::restore(
            row.try_get("id")?,
            row.try_get("product_id")?,
            row.try_get("product_name")?,
            try_get_u32(row, "quantity")?,
            try_get_money(row, "unit_price")?,
            row.try_get("size")?,
        ))
    }
}

impl<'r> FromRow<'r, PgRow> for ShippingAddress {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            zip_code: row.try_get("zip_code")?,
            country: row.try_get("country")?,
            phone: row.try_get("phone")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            method: try_parse(row, "method")?,
            status: try_parse(row, "payment_status")?,
            transaction_id: row.try_get("transaction_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Order row without its children.
fn order_header(row: &PgRow) -> sqlx::Result<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        buyer: UserId::from_uuid(row.try_get("buyer_id")?),
        seller: UserId::from_uuid(row.try_get("seller_id")?),
        status: try_parse(row, "status")?,
        items: vec![],
        subtotal: try_get_money(row, "subtotal")?,
        shipping_fee: try_get_money(row, "shipping_fee")?,
        total: try_get_money(row, "total")?,
        shipping_address: None,
        payment: None,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// First free slug in `table` for `base`. Candidates are fetched once and checked locally.
async fn free_slug(conn: &mut PgConnection, table: &str, base: &str) -> Result<String> {
    let sql = format!("SELECT slug FROM {table} WHERE slug = $1 OR slug LIKE $2");
    let taken: HashSet<String> = query_scalar::<_, String>(&sql)
        .bind(base)
        .bind(format!("{base}-%"))
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .collect();
    Ok(unique_slug(base, |s| taken.contains(s)))
}

/// Fills in items, shipping address and payment for already loaded order headers.
async fn attach_children(conn: &mut PgConnection, mut orders: Vec<Order>) -> Result<Vec<Order>> {
    if orders.is_empty() { return Ok(orders); }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    let rows = query(
        "SELECT order_id, id, product_id, product_name, quantity, unit_price, size
         FROM order_items WHERE order_id = ANY($1) ORDER BY position",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        let order_id: Uuid = row.try_get("order_id")?;
        items.entry(order_id).or_default().push(OrderItem::from_row(&row)?);
    }

    let mut addresses: HashMap<Uuid, ShippingAddress> = HashMap::new();
    let rows = query("SELECT * FROM shipping_addresses WHERE order_id = ANY($1)").bind(&ids).fetch_all(&mut *conn).await?;
    for row in rows {
        addresses.insert(row.try_get("order_id")?, ShippingAddress::from_row(&row)?);
    }

    let mut payments: HashMap<Uuid, Payment> = HashMap::new();
    let rows = query(
        "SELECT order_id, method, status AS payment_status, transaction_id, created_at FROM payments WHERE order_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    for row in rows {
        payments.insert(row.try_get("order_id")?, Payment::from_row(&row)?);
    }

    for order in &mut orders {
        order.items = items.remove(&order.id).unwrap_or_default();
        order.shipping_address = addresses.remove(&order.id);
        order.payment = payments.remove(&order.id);
    }
    Ok(orders)
}

async fn load_orders(conn: &mut PgConnection, filter: &str, id: Uuid) -> Result<Vec<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} = $1 ORDER BY created_at DESC, id DESC");
    let headers = query(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(order_header)
        .collect::<sqlx::Result<Vec<_>>>()?;
    attach_children(conn, headers).await
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn insert_category(&self, name: &str) -> Result<Category> {
        let mut tx = self.pool.begin().await?;
        let slug = free_slug(&mut tx, "categories", &slug_base(name, CATEGORY_SLUG_FALLBACK)).await?;
        let category = Category::create(name.trim(), slug);
        query("INSERT INTO categories (id, name, slug, created_at) VALUES ($1, $2, $3, $4)")
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.created_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(category)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(query_as::<_, Category>("SELECT id, name, slug, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Category> {
        query_as::<_, Category>("SELECT id, name, slug, created_at FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ShopError::NotFound("category"))
    }

    async fn insert_product(&self, seller: UserId, draft: &ProductDraft, price: Money) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let slug = free_slug(&mut tx, "products", &slug_base(&draft.name, PRODUCT_SLUG_FALLBACK)).await?;
        let product = Product::create(seller, draft, price, slug);
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        query(&sql)
            .bind(product.id)
            .bind(product.seller.as_uuid())
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(product.price.amount())
            .bind(to_i32(product.stock)?)
            .bind(to_i32(product.sold)?)
            .bind(product.is_featured)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match ShopError::from(e) {
                ShopError::Storage(e) if is_foreign_key_violation(&e) => ShopError::NotFound("category"),
                other => other,
            })?;
        tx.commit().await?;
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?.ok_or(ShopError::NotFound("product"))
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
        query_as::<_, Product>(&sql).bind(slug).fetch_optional(&self.pool).await?.ok_or(ShopError::NotFound("product"))
    }

    async fn update_product(&self, id: Uuid, draft: &ProductDraft, price: Money) -> Result<Product> {
        let sql = format!(
            "UPDATE products SET name = $2, description = $3, price = $4, stock = $5, category_id = $6,
                 is_featured = $7, updated_at = $8
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        query_as::<_, Product>(&sql)
            .bind(id)
            .bind(draft.name.trim())
            .bind(&draft.description)
            .bind(price.amount())
            .bind(to_i32(draft.stock)?)
            .bind(draft.category_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match ShopError::from(e) {
                ShopError::Storage(e) if is_foreign_key_violation(&e) => ShopError::NotFound("category"),
                other => other,
            })?
            .ok_or(ShopError::NotFound("product"))
    }

    async fn delete_product(&self, id: Uuid) -> Result<()> {
        // cart_items and wishlist_items cascade; order_items keep their snapshot.
        let deleted = query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?.rows_affected();
        if deleted == 0 { return Err(ShopError::NotFound("product")); }
        Ok(())
    }

    async fn search_products(&self, q: &ProductQuery) -> Result<Vec<Product>> {
        let category = match q.category.as_deref() {
            Some(slug) => Some(self.category_by_slug(slug).await?.id),
            None => None,
        };
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE ($1::uuid IS NULL OR category_id = $1)
               AND ($2::text IS NULL OR strpos(lower(name), $2) > 0)
             ORDER BY created_at DESC, id DESC"
        );
        Ok(query_as::<_, Product>(&sql).bind(category).bind(q.search_term()).fetch_all(&self.pool).await?)
    }

    async fn products_by_seller(&self, seller: UserId) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 ORDER BY created_at, id");
        Ok(query_as::<_, Product>(&sql).bind(seller.as_uuid()).fetch_all(&self.pool).await?)
    }
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    error.as_database_error().map_or(false, |db| db.is_foreign_key_violation())
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>> {
        Ok(query_as::<_, CartLine>(
            "SELECT ci.id, ci.product_id, ci.quantity, ci.size, p.name AS product_name, p.seller_id, p.price
             FROM cart_items ci
             JOIN carts c ON c.id = ci.cart_id
             JOIN products p ON p.id = ci.product_id
             WHERE c.user_id = $1
             ORDER BY ci.created_at, ci.id",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_cart_item(&self, user: UserId, product_id: Uuid, size: Option<String>, qty: u32) -> Result<CartItem> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let exists: Option<Uuid> =
            query_scalar("SELECT id FROM products WHERE id = $1").bind(product_id).fetch_optional(&mut *tx).await?;
        if exists.is_none() { return Err(ShopError::NotFound("product")); }

        let cart_id: Uuid = query_scalar(
            "INSERT INTO carts (id, user_id, is_active, created_at, updated_at) VALUES ($1, $2, TRUE, $3, $3)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
             RETURNING id",
        )
        .bind(Uuid::now_v7())
        .bind(user.as_uuid())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO cart_items AS ci (id, cart_id, product_id, quantity, size, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (cart_id, product_id, (COALESCE(size, '')))
             DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity
             RETURNING {CART_ITEM_COLUMNS}"
        );
        let item = query_as::<_, CartItem>(&sql)
            .bind(Uuid::now_v7())
            .bind(cart_id)
            .bind(product_id)
            .bind(to_i32(qty)?)
            .bind(crate::domain::aggregates::normalize_size(size))
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(cart_id = %cart_id, item_id = %item.id, quantity = item.quantity, "cart item stored");
        Ok(item)
    }

    async fn update_cart_item(&self, user: UserId, item_id: Uuid, change: QuantityChange) -> Result<Option<CartItem>> {
        match change {
            QuantityChange::Remove => {
                if self.remove_cart_item(user, item_id).await? { Ok(None) } else { Err(ShopError::NotFound("cart item")) }
            }
            QuantityChange::Set(qty) => {
                let sql = format!(
                    "UPDATE cart_items ci SET quantity = $3 FROM carts c
                     WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2
                     RETURNING {CART_ITEM_COLUMNS}"
                );
                query_as::<_, CartItem>(&sql)
                    .bind(item_id)
                    .bind(user.as_uuid())
                    .bind(to_i32(qty)?)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(Some)
                    .ok_or(ShopError::NotFound("cart item"))
            }
        }
    }

    async fn remove_cart_item(&self, user: UserId, item_id: Uuid) -> Result<bool> {
        let deleted = query(
            "DELETE FROM cart_items ci USING carts c WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2",
        )
        .bind(item_id)
        .bind(user.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(deleted > 0)
    }

    async fn clear_cart(&self, user: UserId) -> Result<()> {
        query("DELETE FROM cart_items ci USING carts c WHERE ci.cart_id = c.id AND c.user_id = $1")
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for PgStore {
    async fn wishlist_products(&self, user: UserId) -> Result<Vec<Product>> {
        Ok(query_as::<_, Product>(
            "SELECT p.id, p.seller_id, p.category_id, p.name, p.slug, p.description, p.price, p.stock, p.sold,
                    p.is_featured, p.created_at, p.updated_at
             FROM wishlist_items w JOIN products p ON p.id = w.product_id
             WHERE w.user_id = $1
             ORDER BY w.created_at",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_to_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()> {
        query(
            "INSERT INTO wishlist_items (user_id, product_id, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user.as_uuid())
        .bind(product_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match ShopError::from(e) {
            ShopError::Storage(e) if is_foreign_key_violation(&e) => ShopError::NotFound("product"),
            other => other,
        })?;
        Ok(())
    }

    async fn remove_from_wishlist(&self, user: UserId, product_id: Uuid) -> Result<()> {
        query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.as_uuid())
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
    let sql = format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)");
    query(&sql)
        .bind(order.id)
        .bind(order.buyer.as_uuid())
        .bind(order.seller.as_uuid())
        .bind(order.status.as_str())
        .bind(order.subtotal.amount())
        .bind(order.shipping_fee.amount())
        .bind(order.total.amount())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

    for (position, item) in order.items.iter().enumerate() {
        query(
            "INSERT INTO order_items (id, order_id, position, product_id, product_name, quantity, unit_price, size)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(item.id)
        .bind(order.id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(to_i32(item.quantity)?)
        .bind(item.unit_price.amount())
        .bind(&item.size)
        .execute(&mut *conn)
        .await?;
    }

    if let Some(address) = &order.shipping_address {
        query(
            "INSERT INTO shipping_addresses (order_id, full_name, email, address, city, state, zip_code, country, phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(&address.full_name)
        .bind(&address.email)
        .bind(&address.address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(&address.phone)
        .execute(&mut *conn)
        .await?;
    }

    if let Some(payment) = &order.payment {
        query("INSERT INTO payments (order_id, method, status, transaction_id, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(order.id)
            .bind(payment.method.as_str())
            .bind(payment.status.as_str())
            .bind(&payment.transaction_id)
            .bind(payment.created_at)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(&self, placement: OrderPlacement) -> Result<Order> {
        let OrderPlacement { order, consumed_cart_items } = placement;
        // Dropping `tx` on any early return rolls every statement back.
        let mut tx = self.pool.begin().await?;

        for item in &order.items {
            let qty = to_i32(item.quantity)?;
            let reserved = query(
                "UPDATE products SET stock = stock - $2, sold = sold + $2, updated_at = $3 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.product_id)
            .bind(qty)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if reserved == 0 {
                let exists: Option<Uuid> = query_scalar("SELECT id FROM products WHERE id = $1")
                    .bind(item.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                return Err(match exists {
                    Some(_) => ShopError::InsufficientStock(item.product_name.clone()),
                    None => ShopError::NotFound("product"),
                });
            }
        }

        insert_order(&mut tx, &order).await?;

        if !consumed_cart_items.is_empty() {
            query("DELETE FROM cart_items ci USING carts c WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.id = ANY($2)")
                .bind(order.buyer.as_uuid())
                .bind(&consumed_cart_items)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn order(&self, id: Uuid) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        load_orders(&mut conn, "id", id).await?.pop().ok_or(ShopError::NotFound("order"))
    }

    async fn orders_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        load_orders(&mut conn, "buyer_id", buyer.as_uuid()).await
    }

    async fn orders_for_seller(&self, seller: UserId) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        load_orders(&mut conn, "seller_id", seller.as_uuid()).await
    }

    async fn set_order_status(&self, id: Uuid, next: OrderStatus) -> Result<(OrderStatus, Order)> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> = query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = current.ok_or(ShopError::NotFound("order"))?;
        let previous: OrderStatus = current
            .parse()
            .map_err(|e| ShopError::Storage(sqlx::Error::Decode(Box::new(e))))?;
        if !previous.can_transition_to(next) {
            return Err(ShopError::InvalidTransition { from: previous, to: next });
        }

        let updated_at: DateTime<Utc> = Utc::now();
        query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(next.as_str())
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;

        let order = load_orders(&mut tx, "id", id).await?.pop().ok_or(ShopError::NotFound("order"))?;
        tx.commit().await?;
        Ok((previous, order))
    }
}
