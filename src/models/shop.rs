use serde::{Deserialize, Serialize};

use super::Identity;

pub type ShopId = i64;

/// A shop, owned directly by the user who created it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub address: String,
    pub owner_id: Identity,
}

#[derive(Debug, Clone)]
pub struct NewShop {
    pub name: String,
    pub address: String,
    pub owner_id: Identity,
}

/// Editable fields of a shop. Ownership cannot be transferred.
#[derive(Deserialize, Debug, Clone)]
pub struct ShopChanges {
    pub name: String,
    pub address: String,
}
