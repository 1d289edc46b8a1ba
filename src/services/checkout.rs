//! Checkout: turns a cart, or a single "buy now" product, into an order.
//!
//! Totals are always recomputed here from current catalog prices. The order,
//! its items, shipping address and payment, the stock reservation and the
//! removal of consumed cart lines are committed by the store as one unit.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{check_size, CartLine, Order, Payment, PaymentMethod, ShippingAddress};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::UserId;
use crate::pricing::Totals;
use crate::publisher::EventPublisher;
use crate::store::{OrderPlacement, SharedStore};
use crate::{Result, ShopError};

/// What is being bought.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutSource {
    /// Everything currently in the buyer's cart.
    Cart,
    /// One unit of a single product. The cart is left untouched.
    Product { product_id: Uuid, size: Option<String> },
}

/// Buyer-supplied shipping details and payment choice.
#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(flatten)]
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckoutQuote {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Clone)]
pub struct CheckoutService {
    store: SharedStore,
    publisher: EventPublisher,
}

impl CheckoutService {
    pub fn new(store: SharedStore, publisher: EventPublisher) -> Self { Self { store, publisher } }

    /// The totals placing this checkout would record, without side effects.
    #[instrument(skip(self))]
    pub async fn quote(&self, buyer: UserId, source: CheckoutSource) -> Result<CheckoutQuote> {
        let lines = self.resolve(buyer, &source).await?;
        let totals = Totals::of(&lines);
        Ok(CheckoutQuote { lines, totals })
    }

    /// Places the order and returns its id.
    #[instrument(skip(self, form), fields(payment_method = form.payment_method.as_str()))]
    pub async fn place(&self, buyer: UserId, source: CheckoutSource, form: CheckoutForm) -> Result<Uuid> {
        let lines = self.resolve(buyer, &source).await?;
        form.shipping.validate()?;

        let consumed_cart_items = match source {
            CheckoutSource::Cart => lines.iter().map(|line| line.id).collect(),
            CheckoutSource::Product { .. } => vec![],
        };
        let order = Order::place(buyer, &lines, form.shipping, Payment::pending(form.payment_method))?;
        let order = self.store.place_order(OrderPlacement { order, consumed_cart_items }).await?;

        info!(order_id = %order.id, total = %order.total, items = order.item_count(), "order placed");
        self.publisher.publish(&OrderEvent::placed(&order)).await;
        Ok(order.id)
    }

    async fn resolve(&self, buyer: UserId, source: &CheckoutSource) -> Result<Vec<CartLine>> {
        match source {
            CheckoutSource::Cart => {
                let lines = self.store.cart_lines(buyer).await?;
                if lines.is_empty() { return Err(ShopError::EmptyCart); }
                Ok(lines)
            }
            CheckoutSource::Product { product_id, size } => {
                let size = check_size(size.clone())?;
                let product = self.store.product(*product_id).await?;
                Ok(vec![CartLine::from_parts(
                    Uuid::now_v7(),
                    product.id,
                    product.name,
                    product.seller,
                    product.price,
                    1,
                    size,
                )])
            }
        }
    }
}
