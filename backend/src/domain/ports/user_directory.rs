//! Driving port for user registration and lookup.

use async_trait::async_trait;

use crate::domain::{Error, NewUser, Product, User, UserId};

/// Inbound contract for user operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a user. Fails with `conflict` when the email is taken.
    async fn register(&self, user: NewUser) -> Result<User, Error>;

    /// Fetch one user; `not_found` when absent.
    async fn get(&self, id: UserId) -> Result<User, Error>;

    /// Every registered user.
    async fn list(&self) -> Result<Vec<User>, Error>;

    /// Products owned by a user; `not_found` when the user is absent.
    async fn list_products(&self, id: UserId) -> Result<Vec<Product>, Error>;
}
