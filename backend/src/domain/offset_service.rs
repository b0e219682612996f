//! Offset registry service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::offsets::{
    Allocation, AllocationError, NewOffset, Offset, OffsetAllocationEntry, OffsetAllocator,
    OffsetId,
};
use crate::domain::ports::{
    AllocateOffsetsRequest, AllocationCommand, AllocationMetrics, AllocationOutcome,
    OffsetPersistenceError, OffsetRegistry, OffsetRepository, ProductRepository,
};
use crate::domain::product_service::product_not_found;
use crate::domain::user_service::map_product_error;
use crate::domain::{CarbonMass, Error, ProductId};

/// Implements [`OffsetRegistry`].
#[derive(Clone)]
pub struct OffsetService<O, P, M> {
    offsets: Arc<O>,
    products: Arc<P>,
    metrics: Arc<M>,
    allocator: OffsetAllocator,
}

impl<O, P, M> OffsetService<O, P, M> {
    /// Create a new service.
    pub fn new(
        offsets: Arc<O>,
        products: Arc<P>,
        metrics: Arc<M>,
        allocator: OffsetAllocator,
    ) -> Self {
        Self {
            offsets,
            products,
            metrics,
            allocator,
        }
    }
}

fn insufficient_supply(error: AllocationError) -> Error {
    match error {
        AllocationError::InsufficientSupply {
            requested,
            available,
        } => Error::insufficient_supply(error.to_string()).with_details(json!({
            "requestedTonnes": requested.as_tonnes(),
            "availableTonnes": available.as_tonnes(),
            "code": "insufficient_supply",
        })),
    }
}

fn map_offset_error(error: OffsetPersistenceError) -> Error {
    match error {
        OffsetPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("offset repository unavailable: {message}"))
        }
        OffsetPersistenceError::Query { message } => {
            Error::internal(format!("offset repository error: {message}"))
        }
        OffsetPersistenceError::MissingProduct { product_id } => product_not_found(product_id),
        OffsetPersistenceError::Rejected { reason } => insufficient_supply(reason),
    }
}

fn offset_not_found(id: OffsetId) -> Error {
    Error::not_found(format!("offset {id} not found")).with_details(json!({
        "resource": "offset",
        "id": id.get(),
    }))
}

impl<O, P, M> OffsetService<O, P, M>
where
    O: OffsetRepository,
    P: ProductRepository,
    M: AllocationMetrics,
{
    async fn record(&self, outcome: AllocationOutcome, allocated: CarbonMass) {
        if let Err(err) = self.metrics.record(outcome, allocated).await {
            warn!(error = %err, "failed to record allocation metrics");
        }
    }
}

#[async_trait]
impl<O, P, M> OffsetRegistry for OffsetService<O, P, M>
where
    O: OffsetRepository,
    P: ProductRepository,
    M: AllocationMetrics,
{
    async fn register(&self, offset: NewOffset) -> Result<Offset, Error> {
        let stored = self.offsets.create(&offset).await.map_err(map_offset_error)?;
        info!(
            offset_id = stored.id().get(),
            tonnes = stored.tonnes().as_tonnes(),
            "offset registered"
        );
        Ok(stored)
    }

    async fn get(&self, id: OffsetId) -> Result<Offset, Error> {
        self.offsets
            .find_by_id(id)
            .await
            .map_err(map_offset_error)?
            .ok_or_else(|| offset_not_found(id))
    }

    async fn list(&self, only_available: bool) -> Result<Vec<Offset>, Error> {
        self.offsets
            .list(only_available)
            .await
            .map_err(map_offset_error)
    }

    async fn allocate(&self, request: AllocateOffsetsRequest) -> Result<Allocation, Error> {
        let command = AllocationCommand {
            product_id: request.product_id,
            target: request.target,
            coverage: request.coverage,
            allocator: self.allocator,
        };
        match self.offsets.allocate(command).await {
            Ok(allocation) => {
                let outcome = if allocation.is_complete() {
                    AllocationOutcome::Covered
                } else {
                    AllocationOutcome::Partial
                };
                info!(
                    product_id = request.product_id.get(),
                    requested_kg = allocation.requested.kilograms(),
                    allocated_kg = allocation.allocated.kilograms(),
                    shortfall_kg = allocation.shortfall.kilograms(),
                    policy = %self.allocator.policy(),
                    "offsets allocated"
                );
                self.record(outcome, allocation.allocated).await;
                Ok(allocation)
            }
            Err(OffsetPersistenceError::Rejected { reason }) => {
                warn!(
                    product_id = request.product_id.get(),
                    %reason,
                    "allocation rejected"
                );
                self.record(AllocationOutcome::Rejected, CarbonMass::ZERO)
                    .await;
                Err(insufficient_supply(reason))
            }
            Err(other) => Err(map_offset_error(other)),
        }
    }

    async fn list_allocations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<OffsetAllocationEntry>, Error> {
        if self
            .products
            .find_by_id(product_id)
            .await
            .map_err(map_product_error)?
            .is_none()
        {
            return Err(product_not_found(product_id.get()));
        }
        self.offsets
            .list_allocations(product_id)
            .await
            .map_err(map_offset_error)
    }
}

#[cfg(test)]
#[path = "offset_service_tests.rs"]
mod tests;
