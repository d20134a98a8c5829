use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Store, StoreError};
use crate::models::{
    Category, Identity, NewProduct, NewShop, NewUser, Product, ProductChanges, ProductId, Shop,
    ShopChanges, ShopId, User,
};

/// A `Store` kept entirely in process memory. Ids start at 1 and are never reused.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    shops: BTreeMap<ShopId, Shop>,
    products: BTreeMap<ProductId, Product>,
    categories: Vec<Category>,
    last_user_id: i64,
    last_shop_id: ShopId,
    last_product_id: ProductId,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<Identity, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("user"));
        }
        tables.last_user_id += 1;
        let id = Identity::new(tables.last_user_id);
        tables.users.insert(
            id.get(),
            User {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
            },
        );
        debug!("Inserted user {}", id);
        Ok(id)
    }

    async fn find_shop_by_id(&self, id: ShopId) -> Result<Option<Shop>, StoreError> {
        Ok(self.tables.read().await.shops.get(&id).cloned())
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError> {
        Ok(self.tables.read().await.shops.values().cloned().collect())
    }

    async fn insert_shop(&self, shop: NewShop) -> Result<ShopId, StoreError> {
        let mut tables = self.tables.write().await;
        tables.last_shop_id += 1;
        let id = tables.last_shop_id;
        tables.shops.insert(
            id,
            Shop {
                id,
                name: shop.name,
                address: shop.address,
                owner_id: shop.owner_id,
            },
        );
        Ok(id)
    }

    async fn update_shop(&self, id: ShopId, changes: ShopChanges) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.shops.get_mut(&id) {
            Some(shop) => {
                shop.name = changes.name;
                shop.address = changes.address;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_shop(&self, id: ShopId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.shops.remove(&id).is_none() {
            return Ok(false);
        }
        tables.products.retain(|_, p| p.shop_id != id);
        Ok(true)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductId, StoreError> {
        let mut tables = self.tables.write().await;
        tables.last_product_id += 1;
        let id = tables.last_product_id;
        tables.products.insert(
            id,
            Product {
                id,
                shop_id: product.shop_id,
                name: product.name,
                description: product.description,
                categories: product.categories,
            },
        );
        Ok(id)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.products.get_mut(&id) {
            Some(product) => {
                product.name = changes.name;
                product.description = changes.description;
                product.categories = changes.categories;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.tables.read().await.categories.clone())
    }

    async fn seed_categories(&self, names: &[String]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        for name in names {
            if tables.categories.iter().any(|c| &c.name == name) {
                continue;
            }
            let id = tables.categories.len() as i64 + 1;
            tables.categories.push(Category {
                id,
                name: name.clone(),
            });
        }
        Ok(())
    }
}
