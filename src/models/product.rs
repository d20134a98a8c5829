use serde::{Deserialize, Serialize};

use super::ShopId;

pub type ProductId = i64;

/// A product listed in a shop. It has no owner of its own; ownership is
/// inherited from the parent shop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub shop_id: ShopId,
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
}

/// Editable fields of a product. Moving a product to another shop is not supported.
#[derive(Deserialize, Debug, Clone)]
pub struct ProductChanges {
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
}
