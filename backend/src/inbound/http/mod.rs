//! HTTP inbound adapter exposing REST endpoints.

pub mod dto;
pub mod emissions;
pub mod error;
pub mod health;
pub mod offsets;
pub mod products;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod users;
pub mod validation;

pub use error::ApiResult;
