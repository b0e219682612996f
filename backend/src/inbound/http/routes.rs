//! Route table for the HTTP adapter.
//!
//! ```text
//! GET /            banner
//! GET /health/*    probes
//! /api/v1/...      resource endpoints
//! ```

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::inbound::http::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::inbound::http::{emissions, offsets, products, users};

/// Body of the root banner.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BannerResponse {
    #[schema(example = "CarbonTrack API is running")]
    pub message: String,
}

/// Service banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", body = BannerResponse)),
    tags = ["health"],
    operation_id = "root"
)]
#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(BannerResponse {
        message: "CarbonTrack API is running".to_owned(),
    })
}

/// Register the `/api/v1` scope and the extractor error handlers.
///
/// Callers add `web::Data<HttpState>` themselves.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api/v1")
                .service(users::list_users)
                .service(users::create_user)
                .service(users::list_user_products)
                .service(users::get_user)
                .service(products::list_products)
                .service(products::create_product)
                .service(products::replace_inputs)
                .service(products::reestimate_product)
                .service(offsets::allocate_offsets)
                .service(offsets::list_allocations)
                .service(products::get_product)
                .service(emissions::list_emissions)
                .service(emissions::estimate)
                .service(offsets::list_offsets)
                .service(offsets::register_offset)
                .service(offsets::get_offset),
        );
}
