//! Catalog service: categories and seller-managed products.

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Category, NewCategory, Product, ProductDraft, ProductQuery};
use crate::domain::value_objects::UserId;
use crate::store::SharedStore;
use crate::{Result, ShopError};

#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
}

impl CatalogService {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn create_category(&self, category: NewCategory) -> Result<Category> {
        category.validate()?;
        if category.name.trim().is_empty() {
            return Err(ShopError::Validation("name must not be blank".into()));
        }
        self.store.insert_category(&category.name).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.store.categories().await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, seller: UserId, draft: ProductDraft) -> Result<Product> {
        let price = draft.check()?;
        self.ensure_category(draft.category_id).await?;
        let product = self.store.insert_product(seller, &draft, price).await?;
        info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.store.product(id).await
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product> {
        self.store.product_by_slug(slug).await
    }

    /// Only the owning seller may edit a product. The slug never changes.
    #[instrument(skip(self, draft))]
    pub async fn update_product(&self, seller: UserId, id: Uuid, draft: ProductDraft) -> Result<Product> {
        self.owned_product(seller, id).await?;
        let price = draft.check()?;
        self.ensure_category(draft.category_id).await?;
        self.store.update_product(id, &draft, price).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, seller: UserId, id: Uuid) -> Result<()> {
        self.owned_product(seller, id).await?;
        self.store.delete_product(id).await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.store.search_products(query).await
    }

    pub async fn seller_products(&self, seller: UserId) -> Result<Vec<Product>> {
        self.store.products_by_seller(seller).await
    }

    async fn owned_product(&self, seller: UserId, id: Uuid) -> Result<Product> {
        let product = self.store.product(id).await?;
        if !product.is_sold_by(seller) { return Err(ShopError::Forbidden("product")); }
        Ok(product)
    }

    async fn ensure_category(&self, category_id: Option<Uuid>) -> Result<()> {
        let Some(id) = category_id else { return Ok(()) };
        let known = self.store.categories().await?.iter().any(|c| c.id == id);
        if known { Ok(()) } else { Err(ShopError::NotFound("category")) }
    }
}
