//! Users API handlers.
//!
//! ```text
//! GET  /api/v1/users
//! POST /api/v1/users {"email":"ada@example.com","displayName":"Ada"}
//! GET  /api/v1/users/{id}
//! GET  /api/v1/users/{id}/products
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{NewUser, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::dto::{ProductResponse, UserResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_user_validation, parse_id};

/// Registration body for `POST /api/v1/users`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
}

/// List registered users.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.users.list().await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// Register a user.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let CreateUserRequest {
        email,
        display_name,
    } = payload.into_inner();
    let new_user = NewUser::try_from_parts(&email, &display_name).map_err(map_user_validation)?;
    let user = state.users.register(new_user).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Fetch one user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<UserResponse>> {
    let id: UserId = parse_id("id", path.into_inner())?;
    let user = state.users.get(id).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Products owned by a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/products",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Products owned by the user", body = [ProductResponse]),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUserProducts"
)]
#[get("/users/{id}/products")]
pub async fn list_user_products(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    let id: UserId = parse_id("id", path.into_inner())?;
    let products = state.users.list_products(id).await?;
    Ok(web::Json(products.iter().map(ProductResponse::from).collect()))
}
