//! Port abstraction for product persistence.
//!
//! Adapters store the estimator inputs alongside the derived estimate and
//! must write both in the same statement so they never drift apart.

use async_trait::async_trait;

use crate::domain::emissions::EmissionInputs;
use crate::domain::{CarbonMass, EmissionsSummary, NewProduct, Product, ProductId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by product repository adapters.
    pub enum ProductPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "product repository query failed: {message}",
        /// The owning user does not exist.
        MissingOwner { owner_id: i64 } => "owner {owner_id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product with its precomputed estimate.
    async fn create(&self, product: &NewProduct) -> Result<Product, ProductPersistenceError>;

    /// Fetch a product by identifier.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductPersistenceError>;

    /// Products ordered by identifier, optionally restricted to one owner.
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Product>, ProductPersistenceError>;

    /// Replace inputs and estimate together. Returns `None` for unknown ids.
    async fn update_estimate(
        &self,
        id: ProductId,
        inputs: &EmissionInputs,
        estimate: CarbonMass,
    ) -> Result<Option<Product>, ProductPersistenceError>;

    /// Estimated and allocated emissions per product.
    async fn list_emissions(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<EmissionsSummary>, ProductPersistenceError>;
}
