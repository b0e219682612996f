//! Driving port for products and their emissions estimates.

use async_trait::async_trait;

use crate::domain::emissions::{EmissionInputs, EmissionInputsDraft};
use crate::domain::{
    CarbonMass, EmissionsSummary, Error, Product, ProductDetails, ProductId, UserId,
};

/// Request to create a product for an existing owner.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateProductRequest {
    pub owner_id: UserId,
    pub details: ProductDetails,
    pub inputs: EmissionInputsDraft,
}

/// Result of a stateless estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionEstimate {
    pub inputs: EmissionInputs,
    pub estimated_emissions: CarbonMass,
}

/// Inbound contract for product operations.
///
/// Every path that stores inputs estimates them first; invalid inputs are
/// rejected with `invalid_request` before anything is written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductCatalogue: Send + Sync {
    /// Create a product and store its initial estimate.
    async fn create(&self, request: CreateProductRequest) -> Result<Product, Error>;

    /// Fetch one product.
    async fn get(&self, id: ProductId) -> Result<Product, Error>;

    /// Products, optionally for one owner.
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Product>, Error>;

    /// Replace a product's inputs and store the new estimate.
    async fn replace_inputs(
        &self,
        id: ProductId,
        inputs: EmissionInputsDraft,
    ) -> Result<Product, Error>;

    /// Recompute the estimate from the stored inputs.
    async fn reestimate(&self, id: ProductId) -> Result<Product, Error>;

    /// Estimate inputs without storing anything.
    async fn estimate(&self, inputs: EmissionInputsDraft) -> Result<EmissionEstimate, Error>;

    /// Estimated and offset emissions per product.
    async fn list_emissions(&self, owner: Option<UserId>) -> Result<Vec<EmissionsSummary>, Error>;
}
