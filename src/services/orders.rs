//! Order history, status lifecycle and the seller dashboard.

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, Product};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{Money, UserId};
use crate::publisher::EventPublisher;
use crate::store::SharedStore;
use crate::{Result, ShopError};

#[derive(Clone, Debug, Serialize)]
pub struct SellerDashboard {
    pub products: Vec<Product>,
    pub total_orders: usize,
    /// Sum of subtotals over orders that were not cancelled. Shipping is excluded.
    pub total_revenue: Money,
}

#[derive(Clone)]
pub struct OrderService {
    store: SharedStore,
    publisher: EventPublisher,
}

impl OrderService {
    pub fn new(store: SharedStore, publisher: EventPublisher) -> Self { Self { store, publisher } }

    /// The buyer's orders, newest first.
    pub async fn list_for_user(&self, buyer: UserId) -> Result<Vec<Order>> {
        self.store.orders_for_buyer(buyer).await
    }

    /// `NotFound` when the order does not exist, `Forbidden` when it belongs to someone else.
    pub async fn get(&self, order_id: Uuid, user: UserId) -> Result<Order> {
        let order = self.store.order(order_id).await?;
        if !order.is_visible_to(user) { return Err(ShopError::Forbidden("order")); }
        Ok(order)
    }

    /// Moves an order along its lifecycle. The seller may make any allowed
    /// transition; the buyer may only cancel.
    #[instrument(skip(self))]
    pub async fn advance_status(&self, actor: UserId, order_id: Uuid, next: OrderStatus) -> Result<Order> {
        let order = self.store.order(order_id).await?;
        let permitted = order.seller == actor || (order.buyer == actor && next == OrderStatus::Cancelled);
        if !permitted { return Err(ShopError::Forbidden("order")); }

        let (from, order) = self.store.set_order_status(order_id, next).await?;
        info!(order_id = %order.id, %from, to = %next, "order status changed");
        self.publisher.publish(&OrderEvent::StatusChanged { order_id: order.id, from, to: next }).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn seller_dashboard(&self, seller: UserId) -> Result<SellerDashboard> {
        let products = self.store.products_by_seller(seller).await?;
        let orders = self.store.orders_for_seller(seller).await?;
        let total_revenue = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.subtotal)
            .sum();
        Ok(SellerDashboard { products, total_orders: orders.len(), total_revenue })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::value_objects::{Money, UserId};
    use crate::services::CheckoutSource;
    use crate::test::context::{checkout_form, TestContext};
    use crate::ShopError;
    use uuid::Uuid;

    async fn place(ctx: &TestContext, name: &str, cents: i64) -> Uuid {
        let product = ctx.product(name, cents, 10).await;
        let source = CheckoutSource::Product { product_id: product.id, size: None };
        ctx.checkout.place(ctx.buyer, source, checkout_form()).await.unwrap()
    }

    #[tokio::test]
    async fn test_orders_are_listed_newest_first() {
        let ctx = TestContext::new();
        let first = place(&ctx, "Shirt", 20_00).await;
        let second = place(&ctx, "Hat", 15_00).await;

        let ids: Vec<_> = ctx.orders.list_for_user(ctx.buyer).await.unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert!(ctx.orders.list_for_user(UserId::generate()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_distinguishes_missing_from_foreign() {
        let ctx = TestContext::new();
        let order_id = place(&ctx, "Shirt", 20_00).await;

        let result = ctx.orders.get(Uuid::now_v7(), ctx.buyer).await;
        assert!(matches!(result, Err(ShopError::NotFound("order"))), "expected NotFound, got {result:?}");

        let result = ctx.orders.get(order_id, UserId::generate()).await;
        assert!(matches!(result, Err(ShopError::Forbidden("order"))), "expected Forbidden, got {result:?}");
    }

    #[tokio::test]
    async fn test_order_carries_shipping_and_payment() {
        let ctx = TestContext::new();
        let order_id = place(&ctx, "Shirt", 20_00).await;

        let order = ctx.orders.get(order_id, ctx.buyer).await.unwrap();
        let address = order.shipping_address.expect("shipping address");
        assert_eq!(address, checkout_form().shipping);
        let payment = order.payment.expect("payment");
        assert_eq!(payment.method, checkout_form().payment_method);
        assert_eq!(payment.transaction_id, None);
    }

    #[tokio::test]
    async fn test_seller_walks_lifecycle() {
        let ctx = TestContext::new();
        let order_id = place(&ctx, "Shirt", 20_00).await;

        for next in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Delivered] {
            let order = ctx.orders.advance_status(ctx.seller, order_id, next).await.unwrap();
            assert_eq!(order.status, next);
        }

        let result = ctx.orders.advance_status(ctx.seller, order_id, OrderStatus::Cancelled).await;
        assert!(
            matches!(result, Err(ShopError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Cancelled })),
            "expected InvalidTransition, got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_skipping_a_step_is_rejected() {
        let ctx = TestContext::new();
        let order_id = place(&ctx, "Shirt", 20_00).await;

        let result = ctx.orders.advance_status(ctx.seller, order_id, OrderStatus::Shipped).await;
        assert!(matches!(result, Err(ShopError::InvalidTransition { .. })), "expected InvalidTransition, got {result:?}");
        assert_eq!(ctx.orders.get(order_id, ctx.buyer).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_buyer_may_only_cancel() {
        let ctx = TestContext::new();
        let order_id = place(&ctx, "Shirt", 20_00).await;

        let result = ctx.orders.advance_status(ctx.buyer, order_id, OrderStatus::Paid).await;
        assert!(matches!(result, Err(ShopError::Forbidden("order"))), "expected Forbidden, got {result:?}");

        let result = ctx.orders.advance_status(UserId::generate(), order_id, OrderStatus::Cancelled).await;
        assert!(matches!(result, Err(ShopError::Forbidden("order"))), "expected Forbidden, got {result:?}");

        let order = ctx.orders.advance_status(ctx.buyer, order_id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_dashboard_excludes_cancelled_revenue() {
        let ctx = TestContext::new();
        place(&ctx, "Shirt", 20_00).await;
        let cancelled = place(&ctx, "Hat", 15_00).await;
        ctx.orders.advance_status(ctx.seller, cancelled, OrderStatus::Cancelled).await.unwrap();

        let dashboard = ctx.orders.seller_dashboard(ctx.seller).await.unwrap();
        assert_eq!(dashboard.products.len(), 2);
        assert_eq!(dashboard.total_orders, 2);
        assert_eq!(dashboard.total_revenue, Money::from_cents(20_00));

        let empty = ctx.orders.seller_dashboard(UserId::generate()).await.unwrap();
        assert_eq!(empty.total_orders, 0);
        assert_eq!(empty.total_revenue, Money::zero());
    }
}
