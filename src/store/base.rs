use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::{memory_store::MemoryStore, mongodb_store::MongoDBStore};
use crate::config::StoreConfig;
use crate::models::{
    Category, Identity, NewProduct, NewShop, NewUser, Product, ProductChanges, ProductId, Shop,
    ShopChanges, ShopId, User,
};

/// Failure of the persistence backend. "Not found" is never an error: lookups
/// return `Ok(None)` for that.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("a {0} with the same key already exists")]
    Duplicate(&'static str),

    #[error("stored data is inconsistent: {0}")]
    Inconsistent(String),
}

/// The Store trait abstracts persistence of users, shops, products and the
/// predefined categories.
///
/// `update_*` and `delete_*` return whether a record was affected.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<Identity, StoreError>;

    async fn find_shop_by_id(&self, id: ShopId) -> Result<Option<Shop>, StoreError>;
    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError>;
    async fn insert_shop(&self, shop: NewShop) -> Result<ShopId, StoreError>;
    async fn update_shop(&self, id: ShopId, changes: ShopChanges) -> Result<bool, StoreError>;
    /// Removes the shop and every product listed in it.
    async fn delete_shop(&self, id: ShopId) -> Result<bool, StoreError>;

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn insert_product(&self, product: NewProduct) -> Result<ProductId, StoreError>;
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<bool, StoreError>;
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    /// Adds any of `names` not already present. Existing categories are kept.
    async fn seed_categories(&self, names: &[String]) -> Result<(), StoreError>;
}

/// Creates a concrete store implementation based on the StoreConfig and seeds
/// the predefined categories into it.
pub async fn create_store(
    config: &StoreConfig,
    categories: &[String],
) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match config {
        StoreConfig::Memory => {
            info!("Using in-memory store.");
            Arc::new(MemoryStore::new())
        }
        StoreConfig::MongoDB(mongo_config) => {
            let store = MongoDBStore::new(mongo_config).await?;
            info!("Successfully created MongoDB store.");
            Arc::new(store)
        }
    };

    store.seed_categories(categories).await?;
    info!("Seeded {} predefined categories.", categories.len());
    Ok(store)
}
