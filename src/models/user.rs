use crate::auth::PasswordHash;

use super::Identity;

/// A registered account as held by the store.
///
/// Deliberately not `Serialize`: the password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Identity,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// An account about to be inserted. The password has already been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
}
