//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven repository ports, backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - Adapters only translate between Diesel rows and domain types.
//! - Row structs (`models.rs`) and the schema (`schema.rs`) stay private.
//! - Every database failure is mapped to the port's persistence error.
//!
//! # Example
//!
//! ```ignore
//! use carbontrack::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/carbontrack")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_offset_repository;
mod diesel_product_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_offset_repository::DieselOffsetRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
