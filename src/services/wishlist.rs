//! Wishlist service.

use tracing::instrument;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::UserId;
use crate::store::SharedStore;
use crate::Result;

#[derive(Clone)]
pub struct WishlistService {
    store: SharedStore,
}

impl WishlistService {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    /// Adding a product twice keeps a single entry.
    #[instrument(skip(self))]
    pub async fn add(&self, user: UserId, product_id: Uuid) -> Result<()> {
        self.store.add_to_wishlist(user, product_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, product_id: Uuid) -> Result<()> {
        self.store.remove_from_wishlist(user, product_id).await
    }

    pub async fn list(&self, user: UserId) -> Result<Vec<Product>> {
        self.store.wishlist_products(user).await
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::value_objects::UserId;
    use crate::test::context::TestContext;
    use crate::ShopError;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_add_is_idempotent_and_ordered() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 1).await;
        let hat = ctx.product("Hat", 15_00, 1).await;

        ctx.wishlist.add(ctx.buyer, shirt.id).await.unwrap();
        ctx.wishlist.add(ctx.buyer, hat.id).await.unwrap();
        ctx.wishlist.add(ctx.buyer, shirt.id).await.unwrap();

        let names: Vec<_> = ctx.wishlist.list(ctx.buyer).await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Shirt".to_string(), "Hat".to_string()]);
        assert!(ctx.wishlist.list(UserId::generate()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 1).await;
        ctx.wishlist.add(ctx.buyer, shirt.id).await.unwrap();

        ctx.wishlist.remove(ctx.buyer, shirt.id).await.unwrap();
        ctx.wishlist.remove(ctx.buyer, shirt.id).await.unwrap();
        assert!(ctx.wishlist.list(ctx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_after_product_deleted() {
        let ctx = TestContext::new();
        let shirt = ctx.product("Shirt", 20_00, 1).await;
        ctx.wishlist.add(ctx.buyer, shirt.id).await.unwrap();
        ctx.catalog.delete_product(ctx.seller, shirt.id).await.unwrap();

        ctx.wishlist.remove(ctx.buyer, shirt.id).await.unwrap();
        ctx.wishlist.remove(ctx.buyer, Uuid::now_v7()).await.unwrap();
        assert!(ctx.wishlist.list(ctx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let ctx = TestContext::new();
        let result = ctx.wishlist.add(ctx.buyer, Uuid::now_v7()).await;
        assert!(matches!(result, Err(ShopError::NotFound("product"))), "expected NotFound, got {result:?}");
    }
}
