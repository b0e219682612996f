//! Offset and allocation API handlers.
//!
//! ```text
//! GET  /api/v1/offsets?available=true
//! POST /api/v1/offsets
//! GET  /api/v1/offsets/{id}
//! POST /api/v1/products/{id}/offset-allocations
//! GET  /api/v1/products/{id}/offset-allocations
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::offsets::{AllocationTarget, CoverageMode, NewOffset, NewOffsetFields, OffsetId};
use crate::domain::ports::AllocateOffsetsRequest;
use crate::domain::{Error, ProductId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::{AllocationEntryResponse, AllocationResponse, OffsetResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_offset_validation, parse_id, parse_tonnes};

/// Body for `POST /api/v1/offsets`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOffsetRequest {
    #[schema(example = "Peatland restoration")]
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(example = "Cumbria, UK")]
    pub location: Option<String>,
    #[schema(example = "https://registry.example.org/projects/123")]
    pub source_url: String,
    #[serde(default)]
    #[schema(example = 1500)]
    pub price_per_tonne_cents: i64,
    /// Supply in tonnes CO2e.
    #[schema(example = 10.0)]
    pub tonnes: f64,
}

/// Query for `GET /api/v1/offsets`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OffsetListQuery {
    /// Only offsets with remaining supply.
    #[serde(default)]
    pub available: bool,
}

/// Whether an allocation must cover its whole target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePayload {
    /// Fail with `insufficient_supply` unless the target is fully covered.
    Full,
    /// Allocate what is available and report the shortfall.
    #[default]
    Partial,
}

impl From<CoveragePayload> for CoverageMode {
    fn from(value: CoveragePayload) -> Self {
        match value {
            CoveragePayload::Full => Self::Full,
            CoveragePayload::Partial => Self::Partial,
        }
    }
}

/// Body for `POST /api/v1/products/{id}/offset-allocations`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocateRequest {
    /// Quantity to cover; defaults to the product's outstanding emissions.
    #[schema(example = 6.0)]
    pub target_tonnes: Option<f64>,
    pub coverage: CoveragePayload,
}

/// An empty body means "cover the outstanding emissions, partially".
fn parse_allocate_body(raw: &[u8]) -> Result<AllocateRequest, Error> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(AllocateRequest::default());
    }
    serde_json::from_slice(raw).map_err(|err| {
        Error::invalid_request(format!("invalid JSON body: {err}"))
            .with_details(json!({ "code": "malformed_body" }))
    })
}

/// List offsets.
#[utoipa::path(
    get,
    path = "/api/v1/offsets",
    params(OffsetListQuery),
    responses((status = 200, description = "Offsets", body = [OffsetResponse])),
    tags = ["offsets"],
    operation_id = "listOffsets"
)]
#[get("/offsets")]
pub async fn list_offsets(
    state: web::Data<HttpState>,
    query: web::Query<OffsetListQuery>,
) -> ApiResult<web::Json<Vec<OffsetResponse>>> {
    let offsets = state.offsets.list(query.available).await?;
    Ok(web::Json(offsets.iter().map(OffsetResponse::from).collect()))
}

/// Register an offset; its remaining supply starts at `tonnes`.
#[utoipa::path(
    post,
    path = "/api/v1/offsets",
    request_body = RegisterOffsetRequest,
    responses(
        (status = 201, description = "Offset registered", body = OffsetResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["offsets"],
    operation_id = "registerOffset"
)]
#[post("/offsets")]
pub async fn register_offset(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterOffsetRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let tonnes = parse_tonnes("tonnes", body.tonnes)?;
    let offset = NewOffset::try_from_fields(NewOffsetFields {
        project_name: &body.project_name,
        description: body.description.as_deref().unwrap_or_default(),
        location: body.location.as_deref(),
        source_url: &body.source_url,
        price_per_tonne_cents: body.price_per_tonne_cents,
        tonnes,
    })
    .map_err(map_offset_validation)?;
    let stored = state.offsets.register(offset).await?;
    Ok(HttpResponse::Created().json(OffsetResponse::from(&stored)))
}

/// Fetch one offset.
#[utoipa::path(
    get,
    path = "/api/v1/offsets/{id}",
    params(("id" = i64, Path, description = "Offset identifier")),
    responses(
        (status = 200, description = "Offset", body = OffsetResponse),
        (status = 404, description = "Unknown offset", body = ErrorSchema)
    ),
    tags = ["offsets"],
    operation_id = "getOffset"
)]
#[get("/offsets/{id}")]
pub async fn get_offset(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<OffsetResponse>> {
    let id: OffsetId = parse_id("id", path.into_inner())?;
    let offset = state.offsets.get(id).await?;
    Ok(web::Json(OffsetResponse::from(&offset)))
}

/// Allocate offsets against a product.
///
/// Partial coverage reports any shortfall; full coverage fails with 422 and
/// changes nothing when supply is short.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/offset-allocations",
    params(("id" = i64, Path, description = "Product identifier")),
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Allocation result", body = AllocationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Unknown product", body = ErrorSchema),
        (status = 422, description = "Insufficient supply for full coverage", body = ErrorSchema)
    ),
    tags = ["offsets"],
    operation_id = "allocateOffsets"
)]
#[post("/products/{id}/offset-allocations")]
pub async fn allocate_offsets(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Bytes,
) -> ApiResult<web::Json<AllocationResponse>> {
    let product_id: ProductId = parse_id("id", path.into_inner())?;
    let body = parse_allocate_body(&payload)?;
    let target = match body.target_tonnes {
        Some(tonnes) => AllocationTarget::Exact(parse_tonnes("targetTonnes", tonnes)?),
        None => AllocationTarget::Outstanding,
    };
    let allocation = state
        .offsets
        .allocate(AllocateOffsetsRequest {
            product_id,
            target,
            coverage: body.coverage.into(),
        })
        .await?;
    Ok(web::Json(AllocationResponse::new(product_id, &allocation)))
}

/// Allocation ledger for a product, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/offset-allocations",
    params(("id" = i64, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Ledger rows", body = [AllocationEntryResponse]),
        (status = 404, description = "Unknown product", body = ErrorSchema)
    ),
    tags = ["offsets"],
    operation_id = "listOffsetAllocations"
)]
#[get("/products/{id}/offset-allocations")]
pub async fn list_allocations(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<AllocationEntryResponse>>> {
    let product_id: ProductId = parse_id("id", path.into_inner())?;
    let entries = state.offsets.list_allocations(product_id).await?;
    Ok(web::Json(
        entries.iter().map(AllocationEntryResponse::from).collect(),
    ))
}

#[cfg(test)]
#[path = "offsets_tests.rs"]
mod tests;
