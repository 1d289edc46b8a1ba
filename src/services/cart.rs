//! Cart service.

use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{check_size, CartItem, CartLine};
use crate::domain::value_objects::{requested_quantity, Money, QuantityChange, UserId};
use crate::pricing::Totals;
use crate::store::SharedStore;
use crate::{Result, ShopError};

/// Response to removing a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub cart_total: Money,
    pub shipping: Money,
}

/// Response to changing a line's quantity. `item_total` is zero when the change removed the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ItemTotals {
    pub item_total: Money,
    pub cart_total: Money,
    pub shipping: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: Totals,
}

impl From<Totals> for CartTotals {
    fn from(totals: Totals) -> Self {
        Self { cart_total: totals.subtotal, shipping: totals.shipping }
    }
}

#[derive(Clone)]
pub struct CartService {
    store: SharedStore,
}

impl CartService {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    /// Adds `qty` of a product, merging into an existing line with the same size.
    #[instrument(skip(self))]
    pub async fn add(&self, user: UserId, product_id: Uuid, size: Option<String>, qty: i64) -> Result<CartItem> {
        let qty = requested_quantity(qty)?;
        let size = check_size(size)?;
        let product = self.store.product(product_id).await?;

        let lines = self.store.cart_lines(user).await?;
        if lines.iter().any(|line| line.seller != product.seller) {
            return Err(ShopError::SellerMismatch);
        }

        let item = self.store.add_cart_item(user, product_id, size, qty).await?;
        debug!(item_id = %item.id, quantity = item.quantity, "added to cart");
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, user: UserId, item_id: Uuid, qty: i64) -> Result<ItemTotals> {
        let updated = self.store.update_cart_item(user, item_id, QuantityChange::from_requested(qty)?).await?;

        let lines = self.store.cart_lines(user).await?;
        let item_total = updated
            .and_then(|item| lines.iter().find(|line| line.id == item.id))
            .map_or_else(Money::zero, |line| line.line_total);
        let totals = Totals::of(&lines);
        Ok(ItemTotals { item_total, cart_total: totals.subtotal, shipping: totals.shipping })
    }

    /// Removing a line that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, item_id: Uuid) -> Result<CartTotals> {
        if !self.store.remove_cart_item(user, item_id).await? {
            debug!("cart item already absent");
        }
        Ok(Totals::of(&self.store.cart_lines(user).await?).into())
    }

    pub async fn list(&self, user: UserId) -> Result<Vec<CartLine>> {
        self.store.cart_lines(user).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user: UserId) -> Result<()> {
        self.store.clear_cart(user).await
    }

    pub async fn summary(&self, user: UserId) -> Result<CartSummary> {
        let lines = self.store.cart_lines(user).await?;
        let totals = Totals::of(&lines);
        Ok(CartSummary { lines, totals })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::value_objects::{Money, UserId};
    use crate::test::context::TestContext;
    use crate::ShopError;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_adding_same_size_twice_merges() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;

        ctx.carts.add(ctx.buyer, shirt.id, Some("M".into()), 1).await.unwrap();
        ctx.carts.add(ctx.buyer, shirt.id, Some("M".into()), 1).await.unwrap();

        let lines = ctx.carts.list(ctx.buyer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].line_total, Money::from_cents(40_00));
    }

    #[tokio::test]
    async fn test_different_sizes_are_separate_lines() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;

        ctx.carts.add(ctx.buyer, shirt.id, Some("M".into()), 1).await.unwrap();
        ctx.carts.add(ctx.buyer, shirt.id, Some("L".into()), 3).await.unwrap();
        ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();
        ctx.carts.add(ctx.buyer, shirt.id, Some("  ".into()), 1).await.unwrap();

        let lines = ctx.carts.list(ctx.buyer).await.unwrap();
        let quantities: Vec<_> = lines.iter().map(|l| (l.size.as_deref(), l.quantity)).collect();
        assert_eq!(quantities, vec![(Some("M"), 1), (Some("L"), 3), (None, 2)]);
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_product_and_bad_quantity() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;

        let result = ctx.carts.add(ctx.buyer, Uuid::now_v7(), None, 1).await;
        assert!(matches!(result, Err(ShopError::NotFound("product"))), "expected NotFound, got {result:?}");

        let result = ctx.carts.add(ctx.buyer, shirt.id, None, 0).await;
        assert!(matches!(result, Err(ShopError::Validation(_))), "expected Validation, got {result:?}");
        assert!(ctx.carts.list(ctx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_oversized_input() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;

        let result = ctx.carts.add(ctx.buyer, shirt.id, Some("XXXXXXXXXXL".into()), 1).await;
        assert!(matches!(result, Err(ShopError::Validation(_))), "expected Validation, got {result:?}");

        let result = ctx.carts.add(ctx.buyer, shirt.id, None, 1 << 31).await;
        assert!(matches!(result, Err(ShopError::Validation(_))), "expected Validation, got {result:?}");
        assert!(ctx.carts.list(ctx.buyer).await.unwrap().is_empty());

        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();
        let result = ctx.carts.update_quantity(ctx.buyer, item.id, 1 << 31).await;
        assert!(matches!(result, Err(ShopError::Validation(_))), "expected Validation, got {result:?}");
        assert_eq!(ctx.carts.list(ctx.buyer).await.unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_add_rejects_second_seller() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        let other = ctx.product_from(UserId::generate(), "Mug", 5_00, 10).await;

        ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();
        let result = ctx.carts.add(ctx.buyer, other.id, None, 1).await;
        assert!(matches!(result, Err(ShopError::SellerMismatch)), "expected SellerMismatch, got {result:?}");
        assert_eq!(ctx.carts.list(ctx.buyer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_does_not_check_stock() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 1).await;

        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 5).await.unwrap();
        assert_eq!(item.quantity, 5);
    }

    #[tokio::test]
    async fn test_update_quantity_reports_totals() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();

        let totals = ctx.carts.update_quantity(ctx.buyer, item.id, 3).await.unwrap();
        assert_eq!(totals.item_total, Money::from_cents(60_00));
        assert_eq!(totals.cart_total, Money::from_cents(60_00));
        assert_eq!(totals.shipping, Money::from_cents(50_00));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 2).await.unwrap();

        let totals = ctx.carts.update_quantity(ctx.buyer, item.id, 0).await.unwrap();
        assert_eq!(totals.item_total, Money::zero());
        assert_eq!(totals.cart_total, Money::zero());
        assert_eq!(totals.shipping, Money::zero());
        assert!(ctx.carts.list(ctx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_foreign_item_is_not_found() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();

        let result = ctx.carts.update_quantity(UserId::generate(), item.id, 4).await;
        assert!(matches!(result, Err(ShopError::NotFound("cart item"))), "expected NotFound, got {result:?}");
        assert_eq!(ctx.carts.list(ctx.buyer).await.unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_remove_missing_item_returns_current_totals() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        let item = ctx.carts.add(ctx.buyer, shirt.id, None, 2).await.unwrap();

        let totals = ctx.carts.remove(ctx.buyer, Uuid::now_v7()).await.unwrap();
        assert_eq!(totals.cart_total, Money::from_cents(40_00));
        assert_eq!(totals.shipping, Money::from_cents(50_00));

        let first = ctx.carts.remove(ctx.buyer, item.id).await.unwrap();
        let second = ctx.carts.remove(ctx.buyer, item.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.cart_total, Money::zero());
    }

    #[tokio::test]
    async fn test_list_without_cart_is_empty() {
        let ctx = TestContext::new();
        assert!(ctx.carts.list(UserId::generate()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_keeps_cart_reusable() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 10).await;
        ctx.carts.add(ctx.buyer, shirt.id, None, 2).await.unwrap();

        ctx.carts.clear(ctx.buyer).await.unwrap();
        assert!(ctx.carts.list(ctx.buyer).await.unwrap().is_empty());

        ctx.carts.add(ctx.buyer, shirt.id, None, 1).await.unwrap();
        assert_eq!(ctx.carts.list(ctx.buyer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_prices_cart() {
        let ctx = TestContext::new();
        let a = ctx.product("Product A", 300_00, 10).await;
        let b = ctx.product("Product B", 50_00, 10).await;
        ctx.carts.add(ctx.buyer, a.id, None, 2).await.unwrap();
        ctx.carts.add(ctx.buyer, b.id, None, 1).await.unwrap();

        let summary = ctx.carts.summary(ctx.buyer).await.unwrap();
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.totals.subtotal, Money::from_cents(650_00));
        assert_eq!(summary.totals.shipping, Money::zero());
        assert_eq!(summary.totals.total, Money::from_cents(650_00));
    }
}
