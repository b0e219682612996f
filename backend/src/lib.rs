//! CarbonTrack backend library.
//!
//! Hexagonal layout: `domain` holds entities, the estimator, the allocator
//! and the services; `inbound::http` drives them over REST; `outbound`
//! implements the repositories for PostgreSQL and for memory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
