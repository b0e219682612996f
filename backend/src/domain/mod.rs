//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence adapters, the two pure computations (emissions estimation and
//! offset allocation) and the services that orchestrate them through ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - CarbonMass: integer-kilogram CO2e quantity, exchanged as decimal tonnes.
//! - User, Product, Offset aggregates and their validated constructors.
//! - `emissions` and `offsets`: estimator and allocator.
//! - `ports`: driving and driven port traits.

pub mod emissions;
pub mod error;
pub mod offsets;
pub mod ports;
pub mod product;
pub mod quantity;
mod record_id;
pub mod trace_id;
pub mod user;

mod offset_service;
mod product_service;
mod user_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::offset_service::OffsetService;
pub use self::product::{
    EmissionsSummary, NewProduct, Product, ProductDetails, ProductId, ProductValidationError,
};
pub use self::product_service::{ProductService, map_estimation_error};
pub use self::quantity::{CarbonMass, MAX_KILOGRAMS, QuantityError};
pub use self::record_id::RecordIdError;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{DisplayName, EmailAddress, NewUser, User, UserId, UserValidationError};
pub use self::user_service::UserService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use carbontrack::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
