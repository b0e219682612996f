//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`AllocationMetrics`]) are implemented by
//! outbound adapters. Driving ports ([`UserDirectory`], [`ProductCatalogue`],
//! [`OffsetRegistry`]) are implemented by the domain services and consumed by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod allocation_metrics;
mod offset_registry;
mod offset_repository;
mod product_catalogue;
mod product_repository;
mod user_directory;
mod user_repository;

pub use allocation_metrics::{
    AllocationMetrics, AllocationMetricsError, AllocationOutcome, NoOpAllocationMetrics,
};
#[cfg(test)]
pub use offset_registry::MockOffsetRegistry;
pub use offset_registry::{AllocateOffsetsRequest, OffsetRegistry};
#[cfg(test)]
pub use offset_repository::MockOffsetRepository;
pub use offset_repository::{AllocationCommand, OffsetPersistenceError, OffsetRepository};
#[cfg(test)]
pub use product_catalogue::MockProductCatalogue;
pub use product_catalogue::{CreateProductRequest, EmissionEstimate, ProductCatalogue};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductPersistenceError, ProductRepository};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::UserDirectory;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
