//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound adapter and the
//! request/response payloads they exchange. Error payloads are described by
//! the wrappers in [`crate::inbound::http::schemas`] so the domain error type
//! stays free of utoipa derives.
//!
//! The document is served by Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use crate::domain::emissions::{EmissionInputsDraft, MaterialDraft, TransportLegDraft};
use crate::inbound::http::dto::{
    AllocationEntryResponse, AllocationLineResponse, AllocationResponse, EmissionsSummaryResponse,
    OffsetResponse, ProductResponse, UserResponse,
};
use crate::inbound::http::emissions::EstimateResponse;
use crate::inbound::http::offsets::{AllocateRequest, CoveragePayload, RegisterOffsetRequest};
use crate::inbound::http::products::CreateProductBody;
use crate::inbound::http::routes::BannerResponse;
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::CreateUserRequest;
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CarbonTrack API",
        description = "Register products, estimate their CO2e emissions and cover them with verified carbon offsets.",
        license(name = "ISC", url = "https://opensource.org/license/isc-license-txt")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::routes::root,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::list_user_products,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::replace_inputs,
        crate::inbound::http::products::reestimate_product,
        crate::inbound::http::emissions::list_emissions,
        crate::inbound::http::emissions::estimate,
        crate::inbound::http::offsets::list_offsets,
        crate::inbound::http::offsets::register_offset,
        crate::inbound::http::offsets::get_offset,
        crate::inbound::http::offsets::allocate_offsets,
        crate::inbound::http::offsets::list_allocations,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        BannerResponse,
        CreateUserRequest,
        UserResponse,
        MaterialDraft,
        TransportLegDraft,
        EmissionInputsDraft,
        CreateProductBody,
        ProductResponse,
        EmissionsSummaryResponse,
        EstimateResponse,
        RegisterOffsetRequest,
        OffsetResponse,
        CoveragePayload,
        AllocateRequest,
        AllocationLineResponse,
        AllocationResponse,
        AllocationEntryResponse,
    )),
    tags(
        (name = "users", description = "User registration and lookup"),
        (name = "products", description = "Products and their emission inputs"),
        (name = "emissions", description = "Emission summaries and ad hoc estimates"),
        (name = "offsets", description = "Offset registry and allocation"),
        (name = "health", description = "Banner and probes")
    )
)]
pub struct ApiDoc;
