//! User directory service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    ProductPersistenceError, ProductRepository, UserDirectory, UserPersistenceError,
    UserRepository,
};
use crate::domain::{Error, NewUser, Product, User, UserId};

/// Implements [`UserDirectory`] over the user and product repositories.
#[derive(Clone)]
pub struct UserService<U, P> {
    users: Arc<U>,
    products: Arc<P>,
}

impl<U, P> UserService<U, P> {
    /// Create a new service with the given repositories.
    pub fn new(users: Arc<U>, products: Arc<P>) -> Self {
        Self { users, products }
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict("email is already registered").with_details(json!({
                "field": "email",
                "value": email,
                "code": "duplicate_email",
            }))
        }
    }
}

pub(crate) fn map_product_error(error: ProductPersistenceError) -> Error {
    match error {
        ProductPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("product repository unavailable: {message}"))
        }
        ProductPersistenceError::Query { message } => {
            Error::internal(format!("product repository error: {message}"))
        }
        ProductPersistenceError::MissingOwner { owner_id } => user_not_found(owner_id),
    }
}

pub(crate) fn user_not_found(id: i64) -> Error {
    Error::not_found(format!("user {id} not found")).with_details(json!({
        "resource": "user",
        "id": id,
    }))
}

impl<U, P> UserService<U, P>
where
    U: UserRepository,
    P: ProductRepository,
{
    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id.get()))
    }
}

#[async_trait]
impl<U, P> UserDirectory for UserService<U, P>
where
    U: UserRepository,
    P: ProductRepository,
{
    async fn register(&self, user: NewUser) -> Result<User, Error> {
        let stored = self.users.create(&user).await.map_err(map_user_error)?;
        info!(user_id = stored.id().get(), "user registered");
        Ok(stored)
    }

    async fn get(&self, id: UserId) -> Result<User, Error> {
        self.require_user(id).await
    }

    async fn list(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    async fn list_products(&self, id: UserId) -> Result<Vec<Product>, Error> {
        self.require_user(id).await?;
        self.products.list(Some(id)).await.map_err(map_product_error)
    }
}
