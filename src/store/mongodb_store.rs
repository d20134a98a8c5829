use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, IndexModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::PasswordHash;
use crate::models::{
    Category, Identity, NewProduct, NewShop, NewUser, Product, ProductChanges, ProductId, Shop,
    ShopChanges, ShopId, User,
};
use crate::store::{Store, StoreError};

/// The config struct for MongoDB connections.
/// Contains the URI and database name.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct MongoDBConfig {
    pub uri: String,
    pub database: String,
}

/// A concrete `Store` implementation that uses MongoDB.
///
/// Records use numeric `_id`s handed out by the `counters` collection, one
/// sequence per record kind.
pub struct MongoDBStore {
    users: Collection<UserDocument>,
    shops: Collection<ShopDocument>,
    products: Collection<ProductDocument>,
    categories: Collection<CategoryDocument>,
    counters: Collection<CounterDocument>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct UserDocument {
    _id: i64,
    name: String,
    email: String,
    password_hash: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ShopDocument {
    _id: i64,
    name: String,
    address: String,
    owner_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ProductDocument {
    _id: i64,
    shop_id: i64,
    name: String,
    description: String,
    categories: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CategoryDocument {
    _id: i64,
    name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CounterDocument {
    _id: String,
    seq: i64,
}

fn backend(context: &str) -> impl Fn(mongodb::error::Error) -> StoreError + '_ {
    move |e| StoreError::Backend(format!("{}: {}", context, e))
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl MongoDBStore {
    /// Creates a new `MongoDBStore` from the given config.
    /// It initializes client connections, sets up indexes, etc.
    pub async fn new(config: &MongoDBConfig) -> Result<Self, StoreError> {
        info!("Connecting to MongoDB at URI: {}", config.uri);

        let mut client_options = ClientOptions::parse(&config.uri)
            .await
            .map_err(backend("Failed to parse MongoDB URI"))?;
        client_options.app_name = Some("Shopgate".to_string());

        let client = Client::with_options(client_options)
            .map_err(backend("Failed to create MongoDB client"))?;
        info!("MongoDB connection established successfully.");

        let database = client.database(&config.database);
        let store = Self {
            users: database.collection::<UserDocument>("users"),
            shops: database.collection::<ShopDocument>("shops"),
            products: database.collection::<ProductDocument>("products"),
            categories: database.collection::<CategoryDocument>("categories"),
            counters: database.collection::<CounterDocument>("counters"),
        };

        // Emails identify accounts at login, so they must be unique.
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store
            .users
            .create_index(unique_email, None)
            .await
            .map_err(backend("Failed to create unique index on email"))?;

        let by_shop = IndexModel::builder().keys(doc! { "shop_id": 1 }).build();
        store
            .products
            .create_index(by_shop, None)
            .await
            .map_err(backend("Failed to create index on shop_id"))?;

        Ok(store)
    }

    /// Atomically allocates the next id of the `kind` sequence.
    async fn next_id(&self, kind: &str) -> Result<i64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters
            .find_one_and_update(doc! { "_id": kind }, doc! { "$inc": { "seq": 1_i64 } }, options)
            .await
            .map_err(backend("Failed to allocate id"))?
            .ok_or_else(|| StoreError::Inconsistent(format!("counter '{}' vanished", kind)))?;
        Ok(counter.seq)
    }

    fn doc_to_user(doc: UserDocument) -> User {
        User {
            id: Identity::new(doc._id),
            name: doc.name,
            email: doc.email,
            password_hash: PasswordHash::from_stored(doc.password_hash),
        }
    }

    fn doc_to_shop(doc: ShopDocument) -> Shop {
        Shop {
            id: doc._id,
            name: doc.name,
            address: doc.address,
            owner_id: Identity::new(doc.owner_id),
        }
    }

    fn shop_to_doc(id: ShopId, shop: NewShop) -> ShopDocument {
        ShopDocument {
            _id: id,
            name: shop.name,
            address: shop.address,
            owner_id: shop.owner_id.get(),
        }
    }

    fn doc_to_product(doc: ProductDocument) -> Product {
        Product {
            id: doc._id,
            shop_id: doc.shop_id,
            name: doc.name,
            description: doc.description,
            categories: doc.categories,
        }
    }

    fn product_to_doc(id: ProductId, product: NewProduct) -> ProductDocument {
        ProductDocument {
            _id: id,
            shop_id: product.shop_id,
            name: product.name,
            description: product.description,
            categories: product.categories,
        }
    }

    fn sorted_by_id() -> FindOptions {
        FindOptions::builder().sort(doc! { "_id": 1 }).build()
    }
}

#[async_trait]
impl Store for MongoDBStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let doc = self
            .users
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(backend("Failed to query user"))?;
        Ok(doc.map(Self::doc_to_user))
    }

    async fn insert_user(&self, user: NewUser) -> Result<Identity, StoreError> {
        let id = self.next_id("users").await?;
        let doc = UserDocument {
            _id: id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash.as_str().to_string(),
        };
        match self.users.insert_one(doc, None).await {
            Ok(_) => {
                debug!("Inserted user document {}", id);
                Ok(Identity::new(id))
            }
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate("user")),
            Err(e) => Err(backend("Failed to insert user")(e)),
        }
    }

    async fn find_shop_by_id(&self, id: ShopId) -> Result<Option<Shop>, StoreError> {
        let doc = self
            .shops
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(backend("Failed to query shop"))?;
        Ok(doc.map(Self::doc_to_shop))
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError> {
        let docs: Vec<ShopDocument> = self
            .shops
            .find(None, Self::sorted_by_id())
            .await
            .map_err(backend("Failed to list shops"))?
            .try_collect()
            .await
            .map_err(backend("Failed to read shop document"))?;
        Ok(docs.into_iter().map(Self::doc_to_shop).collect())
    }

    async fn insert_shop(&self, shop: NewShop) -> Result<ShopId, StoreError> {
        let id = self.next_id("shops").await?;
        self.shops
            .insert_one(Self::shop_to_doc(id, shop), None)
            .await
            .map_err(backend("Failed to insert shop"))?;
        Ok(id)
    }

    async fn update_shop(&self, id: ShopId, changes: ShopChanges) -> Result<bool, StoreError> {
        let result = self
            .shops
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "name": changes.name, "address": changes.address } },
                None,
            )
            .await
            .map_err(backend("Failed to update shop"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_shop(&self, id: ShopId) -> Result<bool, StoreError> {
        let result = self
            .shops
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(backend("Failed to delete shop"))?;
        if result.deleted_count == 0 {
            return Ok(false);
        }
        let removed = self
            .products
            .delete_many(doc! { "shop_id": id }, None)
            .await
            .map_err(backend("Failed to delete products of shop"))?;
        debug!(
            "Deleted shop {} and {} of its products",
            id, removed.deleted_count
        );
        Ok(true)
    }

    async fn find_product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let doc = self
            .products
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(backend("Failed to query product"))?;
        Ok(doc.map(Self::doc_to_product))
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let docs: Vec<ProductDocument> = self
            .products
            .find(None, Self::sorted_by_id())
            .await
            .map_err(backend("Failed to list products"))?
            .try_collect()
            .await
            .map_err(backend("Failed to read product document"))?;
        Ok(docs.into_iter().map(Self::doc_to_product).collect())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductId, StoreError> {
        let id = self.next_id("products").await?;
        self.products
            .insert_one(Self::product_to_doc(id, product), None)
            .await
            .map_err(backend("Failed to insert product"))?;
        Ok(id)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<bool, StoreError> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "name": changes.name,
                    "description": changes.description,
                    "categories": changes.categories,
                } },
                None,
            )
            .await
            .map_err(backend("Failed to update product"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = self
            .products
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(backend("Failed to delete product"))?;
        Ok(result.deleted_count > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let docs: Vec<CategoryDocument> = self
            .categories
            .find(None, Self::sorted_by_id())
            .await
            .map_err(backend("Failed to list categories"))?
            .try_collect()
            .await
            .map_err(backend("Failed to read category document"))?;
        Ok(docs
            .into_iter()
            .map(|doc| Category {
                id: doc._id,
                name: doc.name,
            })
            .collect())
    }

    async fn seed_categories(&self, names: &[String]) -> Result<(), StoreError> {
        let existing = self.list_categories().await?;
        for name in names {
            if existing.iter().any(|c| &c.name == name) {
                continue;
            }
            let id = self.next_id("categories").await?;
            self.categories
                .insert_one(
                    CategoryDocument {
                        _id: id,
                        name: name.clone(),
                    },
                    None,
                )
                .await
                .map_err(backend("Failed to insert category"))?;
            debug!("Seeded category '{}' with id {}", name, id);
        }
        Ok(())
    }
}
