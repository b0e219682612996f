//! Driving port for offsets and allocation.

use async_trait::async_trait;

use crate::domain::offsets::{
    Allocation, AllocationTarget, CoverageMode, NewOffset, Offset, OffsetAllocationEntry, OffsetId,
};
use crate::domain::{Error, ProductId};

/// Request to cover a product's emissions with offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocateOffsetsRequest {
    pub product_id: ProductId,
    pub target: AllocationTarget,
    pub coverage: CoverageMode,
}

/// Inbound contract for offset operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OffsetRegistry: Send + Sync {
    /// Register a new offset.
    async fn register(&self, offset: NewOffset) -> Result<Offset, Error>;

    /// Fetch one offset.
    async fn get(&self, id: OffsetId) -> Result<Offset, Error>;

    /// Offsets, optionally excluding exhausted ones.
    async fn list(&self, only_available: bool) -> Result<Vec<Offset>, Error>;

    /// Allocate supply against a product.
    ///
    /// Fails with `insufficient_supply` when full coverage was requested and
    /// cannot be met; offsets are left untouched in that case.
    async fn allocate(&self, request: AllocateOffsetsRequest) -> Result<Allocation, Error>;

    /// Ledger rows for a product.
    async fn list_allocations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<OffsetAllocationEntry>, Error>;
}
