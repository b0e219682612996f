//! Port abstraction for offsets and the allocation ledger.
//!
//! `allocate` is the only way supply leaves an offset. Adapters run the pure
//! [`OffsetAllocator`] over a consistent snapshot and apply the decrements and
//! ledger rows atomically, so concurrent callers can never drive `remaining`
//! below zero.

use async_trait::async_trait;

use crate::domain::offsets::{
    Allocation, AllocationError, AllocationTarget, CoverageMode, NewOffset, Offset,
    OffsetAllocationEntry, OffsetAllocator, OffsetId,
};
use crate::domain::ProductId;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by offset repository adapters.
    pub enum OffsetPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "offset repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "offset repository query failed: {message}",
        /// The product being covered does not exist.
        MissingProduct { product_id: i64 } => "product {product_id} does not exist",
        /// The allocator refused the request; nothing was written.
        Rejected { reason: AllocationError } => "allocation rejected: {reason}",
    }
}

/// Allocation parameters passed to [`OffsetRepository::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationCommand {
    pub product_id: ProductId,
    pub target: AllocationTarget,
    pub coverage: CoverageMode,
    pub allocator: OffsetAllocator,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OffsetRepository: Send + Sync {
    /// Register an offset with `remaining == tonnes`.
    async fn create(&self, offset: &NewOffset) -> Result<Offset, OffsetPersistenceError>;

    /// Fetch an offset by identifier.
    async fn find_by_id(&self, id: OffsetId) -> Result<Option<Offset>, OffsetPersistenceError>;

    /// Offsets ordered by identifier; exhausted ones are skipped when
    /// `only_available` is set.
    async fn list(&self, only_available: bool) -> Result<Vec<Offset>, OffsetPersistenceError>;

    /// Allocate supply to a product and record the ledger rows atomically.
    async fn allocate(
        &self,
        command: AllocationCommand,
    ) -> Result<Allocation, OffsetPersistenceError>;

    /// Ledger rows for a product, oldest first.
    async fn list_allocations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<OffsetAllocationEntry>, OffsetPersistenceError>;
}
