//! Domain records shared by the auth core, the store and the HTTP layer.

pub mod category;
pub mod identity;
pub mod product;
pub mod shop;
pub mod user;

pub use category::Category;
pub use identity::Identity;
pub use product::{NewProduct, Product, ProductChanges, ProductId};
pub use shop::{NewShop, Shop, ShopChanges, ShopId};
pub use user::{NewUser, User};
