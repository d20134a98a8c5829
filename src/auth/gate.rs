//! Ownership-based authorization.
//!
//! Ownership is the only predicate: there are no roles and no administrator
//! override. Existence is always checked before ownership, so a missing
//! resource is reported as [`Denial::NotFound`] to every caller. Any
//! authenticated caller can therefore probe whether an id exists; that is an
//! accepted trade-off and the order must stay as it is.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use super::error::Denial;
use crate::models::{Identity, Product, ProductId, Shop, ShopId};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        !matches!(self, Action::Read)
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
        }
    }
}

/// A single owned resource, addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Shop(ShopId),
    Product(ProductId),
}

impl Resource {
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Shop(_) => "shop",
            Resource::Product(_) => "product",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Shop(id) => write!(f, "shop {}", id),
            Resource::Product(id) => write!(f, "product {}", id),
        }
    }
}

/// The record an allowed decision was made about, handed back so the caller
/// does not load it a second time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Shop(Shop),
    Product(Product),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Resolved),
    Denied(Denial),
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allowed(_) => "allowed",
            Decision::Denied(denial) => denial.label(),
        }
    }
}

/// Decides allow/deny for an identity, a resource and an action.
pub struct AuthorizationGate {
    store: Arc<dyn Store>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        AuthorizationGate { store }
    }

    /// Runs the checks in order: authentication (mutations only), existence,
    /// ownership (mutations only).
    ///
    /// `identity` is the output of the token verifier, `None` when the request
    /// carried no valid token. Store failures are returned as `Err` and never
    /// turned into a denial.
    pub async fn authorize(
        &self,
        identity: Option<Identity>,
        resource: Resource,
        action: Action,
    ) -> Result<Decision, StoreError> {
        let decision = self.decide(identity, resource, action).await?;
        debug!(
            "Authorization of {} {} for {:?}: {}",
            action.label(),
            resource,
            identity.map(Identity::get),
            decision.label()
        );
        Ok(decision)
    }

    async fn decide(
        &self,
        identity: Option<Identity>,
        resource: Resource,
        action: Action,
    ) -> Result<Decision, StoreError> {
        let actor = match (action.is_mutation(), identity) {
            (true, None) => return Ok(Decision::Denied(Denial::Unauthenticated)),
            (_, actor) => actor,
        };

        let Some(resolved) = self.resolve(resource).await? else {
            return Ok(Decision::Denied(Denial::NotFound));
        };

        if !action.is_mutation() {
            return Ok(Decision::Allowed(resolved));
        }

        let owner = self.owner_of(&resolved).await?;
        if actor == Some(owner) {
            Ok(Decision::Allowed(resolved))
        } else {
            Ok(Decision::Denied(Denial::NotOwner))
        }
    }

    async fn resolve(&self, resource: Resource) -> Result<Option<Resolved>, StoreError> {
        match resource {
            Resource::Shop(id) => Ok(self.store.find_shop_by_id(id).await?.map(Resolved::Shop)),
            Resource::Product(id) => Ok(self
                .store
                .find_product_by_id(id)
                .await?
                .map(Resolved::Product)),
        }
    }

    /// Products are owned through their shop, which is loaded fresh on every decision.
    async fn owner_of(&self, resolved: &Resolved) -> Result<Identity, StoreError> {
        match resolved {
            Resolved::Shop(shop) => Ok(shop.owner_id),
            Resolved::Product(product) => {
                match self.store.find_shop_by_id(product.shop_id).await? {
                    Some(shop) => Ok(shop.owner_id),
                    None => {
                        error!(
                            "Product {} references missing shop {}",
                            product.id, product.shop_id
                        );
                        Err(StoreError::Inconsistent(format!(
                            "product {} references missing shop {}",
                            product.id, product.shop_id
                        )))
                    }
                }
            }
        }
    }
}
