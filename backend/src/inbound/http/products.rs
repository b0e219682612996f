//! Product API handlers.
//!
//! ```text
//! GET  /api/v1/products?ownerId=1
//! POST /api/v1/products
//! GET  /api/v1/products/{id}
//! PUT  /api/v1/products/{id}/inputs
//! POST /api/v1/products/{id}/emissions/estimate
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::emissions::EmissionInputsDraft;
use crate::domain::ports::CreateProductRequest;
use crate::domain::{ProductDetails, ProductId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::ProductResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_product_validation, parse_id};

/// Body for `POST /api/v1/products`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductBody {
    #[schema(example = 1)]
    pub owner_id: i64,
    #[schema(example = "Steel water bottle")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(example = "kitchen")]
    pub category: Option<String>,
    #[serde(default)]
    pub inputs: EmissionInputsDraft,
}

/// Query for `GET /api/v1/products`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Restrict the listing to one owner.
    pub owner_id: Option<i64>,
}

/// List products, optionally for one owner.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products", body = [ProductResponse]),
        (status = 400, description = "Invalid owner identifier", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "listProducts"
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    query: web::Query<ProductListQuery>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    let owner = query
        .owner_id
        .map(|raw| parse_id::<UserId>("ownerId", raw))
        .transpose()?;
    let products = state.products.list(owner).await?;
    Ok(web::Json(products.iter().map(ProductResponse::from).collect()))
}

/// Create a product and estimate its emissions.
///
/// The estimate is derived from `inputs`; it cannot be supplied directly.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductBody,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid fields or estimator inputs", body = ErrorSchema),
        (status = 404, description = "Unknown owner", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/products")]
pub async fn create_product(
    state: web::Data<HttpState>,
    payload: web::Json<CreateProductBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let owner_id = parse_id::<UserId>("ownerId", body.owner_id)?;
    let details = ProductDetails::new(
        &body.name,
        body.description.as_deref().unwrap_or_default(),
        body.category.as_deref(),
    )
    .map_err(map_product_validation)?;
    let product = state
        .products
        .create(CreateProductRequest {
            owner_id,
            details,
            inputs: body.inputs,
        })
        .await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(&product)))
}

/// Fetch one product.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Unknown product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct"
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id: ProductId = parse_id("id", path.into_inner())?;
    let product = state.products.get(id).await?;
    Ok(web::Json(ProductResponse::from(&product)))
}

/// Replace a product's inputs and store the new estimate.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/inputs",
    params(("id" = i64, Path, description = "Product identifier")),
    request_body = EmissionInputsDraft,
    responses(
        (status = 200, description = "Product with the new estimate", body = ProductResponse),
        (status = 400, description = "Invalid estimator inputs", body = ErrorSchema),
        (status = 404, description = "Unknown product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "replaceProductInputs"
)]
#[put("/products/{id}/inputs")]
pub async fn replace_inputs(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<EmissionInputsDraft>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id: ProductId = parse_id("id", path.into_inner())?;
    let product = state
        .products
        .replace_inputs(id, payload.into_inner())
        .await?;
    Ok(web::Json(ProductResponse::from(&product)))
}

/// Recompute the stored estimate from the stored inputs.
///
/// Idempotent: unchanged inputs and factors yield the same value.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/emissions/estimate",
    params(("id" = i64, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product with the recomputed estimate", body = ProductResponse),
        (status = 404, description = "Unknown product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "reestimateProduct"
)]
#[post("/products/{id}/emissions/estimate")]
pub async fn reestimate_product(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id: ProductId = parse_id("id", path.into_inner())?;
    let product = state.products.reestimate(id).await?;
    Ok(web::Json(ProductResponse::from(&product)))
}

#[cfg(test)]
#[path = "products_tests.rs"]
mod tests;
