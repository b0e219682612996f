//! Emissions API handlers.
//!
//! ```text
//! GET  /api/v1/emissions?ownerId=1
//! POST /api/v1/emissions/estimate
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::emissions::EmissionInputsDraft;
use crate::domain::UserId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::EmissionsSummaryResponse;
use crate::inbound::http::products::ProductListQuery;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_id;

/// Result of a stateless estimate.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// Normalised inputs the estimate was computed from.
    pub inputs: EmissionInputsDraft,
    #[schema(example = 0.021)]
    pub estimated_emissions_tonnes: f64,
}

/// Estimated, offset and outstanding emissions per product.
#[utoipa::path(
    get,
    path = "/api/v1/emissions",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Emissions per product", body = [EmissionsSummaryResponse]),
        (status = 400, description = "Invalid owner identifier", body = ErrorSchema)
    ),
    tags = ["emissions"],
    operation_id = "listEmissions"
)]
#[get("/emissions")]
pub async fn list_emissions(
    state: web::Data<HttpState>,
    query: web::Query<ProductListQuery>,
) -> ApiResult<web::Json<Vec<EmissionsSummaryResponse>>> {
    let owner = query
        .owner_id
        .map(|raw| parse_id::<UserId>("ownerId", raw))
        .transpose()?;
    let summaries = state.products.list_emissions(owner).await?;
    Ok(web::Json(
        summaries.iter().map(EmissionsSummaryResponse::from).collect(),
    ))
}

/// Estimate emissions without storing anything.
#[utoipa::path(
    post,
    path = "/api/v1/emissions/estimate",
    request_body = EmissionInputsDraft,
    responses(
        (status = 200, description = "Estimate", body = EstimateResponse),
        (status = 400, description = "Invalid estimator inputs", body = ErrorSchema)
    ),
    tags = ["emissions"],
    operation_id = "estimateEmissions"
)]
#[post("/emissions/estimate")]
pub async fn estimate(
    state: web::Data<HttpState>,
    payload: web::Json<EmissionInputsDraft>,
) -> ApiResult<web::Json<EstimateResponse>> {
    let estimate = state.products.estimate(payload.into_inner()).await?;
    Ok(web::Json(EstimateResponse {
        inputs: EmissionInputsDraft::from(&estimate.inputs),
        estimated_emissions_tonnes: estimate.estimated_emissions.as_tonnes(),
    }))
}
