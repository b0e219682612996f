//! Product catalogue service.
//!
//! Owns the rule that a stored estimate always matches the stored inputs:
//! inputs are validated and estimated here, and only then handed to the
//! repository together with the result.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::emissions::{EmissionInputsDraft, EmissionsEstimator, EstimationError};
use crate::domain::ports::{
    CreateProductRequest, EmissionEstimate, ProductCatalogue, ProductRepository, UserRepository,
};
use crate::domain::user_service::{map_product_error, map_user_error, user_not_found};
use crate::domain::{EmissionsSummary, Error, NewProduct, Product, ProductId, UserId};

/// Implements [`ProductCatalogue`].
#[derive(Clone)]
pub struct ProductService<P, U> {
    products: Arc<P>,
    users: Arc<U>,
    estimator: Arc<EmissionsEstimator>,
}

impl<P, U> ProductService<P, U> {
    /// Create a new service with the given repositories and estimator.
    pub fn new(products: Arc<P>, users: Arc<U>, estimator: Arc<EmissionsEstimator>) -> Self {
        Self {
            products,
            users,
            estimator,
        }
    }
}

/// Map an estimator failure to an `invalid_request` error naming the field.
pub fn map_estimation_error(error: &EstimationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "reason": error.reason().as_str(),
        "code": "invalid_input",
    }))
}

pub(crate) fn product_not_found(id: i64) -> Error {
    Error::not_found(format!("product {id} not found")).with_details(json!({
        "resource": "product",
        "id": id,
    }))
}

impl<P, U> ProductService<P, U>
where
    P: ProductRepository,
    U: UserRepository,
{
    fn estimate_draft(&self, draft: EmissionInputsDraft) -> Result<EmissionEstimate, Error> {
        let (inputs, estimated_emissions) = self
            .estimator
            .estimate_draft(draft)
            .map_err(|err| map_estimation_error(&err))?;
        Ok(EmissionEstimate {
            inputs,
            estimated_emissions,
        })
    }

    async fn require_product(&self, id: ProductId) -> Result<Product, Error> {
        self.products
            .find_by_id(id)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| product_not_found(id.get()))
    }

    async fn store_estimate(&self, id: ProductId, estimate: EmissionEstimate) -> Result<Product, Error> {
        let product = self
            .products
            .update_estimate(id, &estimate.inputs, estimate.estimated_emissions)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| product_not_found(id.get()))?;
        info!(
            product_id = id.get(),
            estimated_kg = product.estimated_emissions.kilograms(),
            "product estimate stored"
        );
        Ok(product)
    }
}

#[async_trait]
impl<P, U> ProductCatalogue for ProductService<P, U>
where
    P: ProductRepository,
    U: UserRepository,
{
    async fn create(&self, request: CreateProductRequest) -> Result<Product, Error> {
        let CreateProductRequest {
            owner_id,
            details,
            inputs,
        } = request;
        let estimate = self.estimate_draft(inputs)?;
        if self
            .users
            .find_by_id(owner_id)
            .await
            .map_err(map_user_error)?
            .is_none()
        {
            return Err(user_not_found(owner_id.get()));
        }

        let product = self
            .products
            .create(&NewProduct {
                owner_id,
                details,
                inputs: estimate.inputs,
                estimated_emissions: estimate.estimated_emissions,
            })
            .await
            .map_err(map_product_error)?;
        info!(
            product_id = product.id.get(),
            owner_id = owner_id.get(),
            estimated_kg = product.estimated_emissions.kilograms(),
            "product created"
        );
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Product, Error> {
        self.require_product(id).await
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Product>, Error> {
        self.products.list(owner).await.map_err(map_product_error)
    }

    async fn replace_inputs(
        &self,
        id: ProductId,
        inputs: EmissionInputsDraft,
    ) -> Result<Product, Error> {
        let estimate = self.estimate_draft(inputs)?;
        self.store_estimate(id, estimate).await
    }

    async fn reestimate(&self, id: ProductId) -> Result<Product, Error> {
        let product = self.require_product(id).await?;
        let estimated_emissions = self
            .estimator
            .estimate(&product.inputs)
            .map_err(|err| map_estimation_error(&err))?;
        if estimated_emissions == product.estimated_emissions {
            return Ok(product);
        }
        self.store_estimate(
            id,
            EmissionEstimate {
                inputs: product.inputs,
                estimated_emissions,
            },
        )
        .await
    }

    async fn estimate(&self, inputs: EmissionInputsDraft) -> Result<EmissionEstimate, Error> {
        self.estimate_draft(inputs)
    }

    async fn list_emissions(&self, owner: Option<UserId>) -> Result<Vec<EmissionsSummary>, Error> {
        self.products
            .list_emissions(owner)
            .await
            .map_err(map_product_error)
    }
}

#[cfg(test)]
#[path = "product_service_tests.rs"]
mod tests;
