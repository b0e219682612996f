//! Request and response bodies shared by several resource handlers.
//!
//! Responses flatten domain records into camelCase JSON with OpenAPI
//! schemas. Masses travel as decimal tonnes. Estimator inputs are exchanged
//! as [`EmissionInputsDraft`] in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::emissions::EmissionInputsDraft;
use crate::domain::offsets::{Allocation, AllocationLine, Offset, OffsetAllocationEntry};
use crate::domain::{EmissionsSummary, Product, ProductId, User};

/// Registered user.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().get(),
            email: user.email().to_string(),
            display_name: user.display_name().to_string(),
            created_at: user.created_at(),
        }
    }
}

/// Product with its stored inputs and derived estimate.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = 1)]
    pub owner_id: i64,
    #[schema(example = "Steel water bottle")]
    pub name: String,
    pub description: String,
    #[schema(example = "kitchen")]
    pub category: Option<String>,
    pub inputs: EmissionInputsDraft,
    /// Derived estimate in tonnes CO2e.
    #[schema(example = 0.021)]
    pub estimated_emissions_tonnes: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.get(),
            owner_id: product.owner_id.get(),
            name: product.details.name().to_owned(),
            description: product.details.description().to_owned(),
            category: product.details.category().map(str::to_owned),
            inputs: EmissionInputsDraft::from(&product.inputs),
            estimated_emissions_tonnes: product.estimated_emissions.as_tonnes(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Estimated, offset and outstanding emissions for one product.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmissionsSummaryResponse {
    pub product_id: i64,
    pub owner_id: i64,
    pub estimated_tonnes: f64,
    pub offset_tonnes: f64,
    pub outstanding_tonnes: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<&EmissionsSummary> for EmissionsSummaryResponse {
    fn from(summary: &EmissionsSummary) -> Self {
        Self {
            product_id: summary.product_id.get(),
            owner_id: summary.owner_id.get(),
            estimated_tonnes: summary.estimated.as_tonnes(),
            offset_tonnes: summary.offset.as_tonnes(),
            outstanding_tonnes: summary.outstanding().as_tonnes(),
            updated_at: summary.updated_at,
        }
    }
}

/// Registered offset with its remaining supply.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OffsetResponse {
    #[schema(example = 3)]
    pub id: i64,
    #[schema(example = "Peatland restoration")]
    pub project_name: String,
    pub description: String,
    #[schema(example = "Cumbria, UK")]
    pub location: Option<String>,
    #[schema(example = "https://registry.example.org/projects/123")]
    pub source_url: String,
    #[schema(example = 1500)]
    pub price_per_tonne_cents: u64,
    /// Original supply.
    #[schema(example = 10.0)]
    pub tonnes: f64,
    /// Supply still available.
    #[schema(example = 4.0)]
    pub remaining_tonnes: f64,
    pub exhausted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Offset> for OffsetResponse {
    fn from(offset: &Offset) -> Self {
        let details = offset.details();
        Self {
            id: offset.id().get(),
            project_name: details.project_name().to_owned(),
            description: details.description().to_owned(),
            location: details.location().map(str::to_owned),
            source_url: details.source_url().to_string(),
            price_per_tonne_cents: offset.price_per_tonne_cents(),
            tonnes: offset.tonnes().as_tonnes(),
            remaining_tonnes: offset.remaining().as_tonnes(),
            exhausted: offset.is_exhausted(),
            created_at: offset.created_at(),
        }
    }
}

/// One offset drawn down by an allocation.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLineResponse {
    pub offset_id: i64,
    pub project_name: String,
    pub consumed_tonnes: f64,
    /// Offset supply left after this allocation.
    pub remaining_tonnes: f64,
    pub cost_cents: u64,
}

impl From<&AllocationLine> for AllocationLineResponse {
    fn from(line: &AllocationLine) -> Self {
        Self {
            offset_id: line.offset.id().get(),
            project_name: line.offset.details().project_name().to_owned(),
            consumed_tonnes: line.consumed.as_tonnes(),
            remaining_tonnes: line.offset.remaining().as_tonnes(),
            cost_cents: line.cost_cents,
        }
    }
}

/// Result of allocating offsets to a product.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub product_id: i64,
    pub requested_tonnes: f64,
    pub allocated_tonnes: f64,
    /// Portion of the request left uncovered.
    pub shortfall_tonnes: f64,
    pub cost_cents: u64,
    pub lines: Vec<AllocationLineResponse>,
}

impl AllocationResponse {
    pub(crate) fn new(product_id: ProductId, allocation: &Allocation) -> Self {
        Self {
            product_id: product_id.get(),
            requested_tonnes: allocation.requested.as_tonnes(),
            allocated_tonnes: allocation.allocated.as_tonnes(),
            shortfall_tonnes: allocation.shortfall.as_tonnes(),
            cost_cents: allocation.cost_cents,
            lines: allocation
                .lines
                .iter()
                .map(AllocationLineResponse::from)
                .collect(),
        }
    }
}

/// Ledger row recording supply drawn for a product.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntryResponse {
    pub id: i64,
    pub product_id: i64,
    pub offset_id: i64,
    pub quantity_tonnes: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&OffsetAllocationEntry> for AllocationEntryResponse {
    fn from(entry: &OffsetAllocationEntry) -> Self {
        Self {
            id: entry.id.get(),
            product_id: entry.product_id.get(),
            offset_id: entry.offset_id.get(),
            quantity_tonnes: entry.quantity.as_tonnes(),
            created_at: entry.created_at,
        }
    }
}
