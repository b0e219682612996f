//! Carbon offsets and the allocation ledger.
//!
//! An offset starts with `remaining == tonnes` and only ever decreases through
//! allocation. `tonnes - remaining` always equals the sum of the ledger
//! entries recorded against the offset.

mod allocator;

use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use super::record_id::define_record_id;
use super::{CarbonMass, ProductId};

pub use allocator::{
    Allocation, AllocationError, AllocationLine, AllocationPolicy, AllocationRequest,
    AllocationTarget, CoverageMode, OffsetAllocator, ParsePolicyError,
};

define_record_id! {
    /// Stable offset identifier (database primary key).
    OffsetId
}

define_record_id! {
    /// Ledger entry identifier.
    AllocationEntryId
}

/// Maximum project name length.
pub const PROJECT_NAME_MAX: usize = 200;
/// Maximum offset description length.
pub const OFFSET_DESCRIPTION_MAX: usize = 2_000;
/// Maximum location length.
pub const LOCATION_MAX: usize = 120;

/// Validation errors for offset registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetValidationError {
    EmptyProjectName,
    ProjectNameTooLong { max: usize },
    DescriptionTooLong { max: usize },
    LocationTooLong { max: usize },
    InvalidSourceUrl,
    UnsupportedSourceScheme { scheme: String },
    NegativePrice,
    EmptySupply,
    RemainingExceedsTonnes,
}

impl OffsetValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyProjectName | Self::ProjectNameTooLong { .. } => "projectName",
            Self::DescriptionTooLong { .. } => "description",
            Self::LocationTooLong { .. } => "location",
            Self::InvalidSourceUrl | Self::UnsupportedSourceScheme { .. } => "sourceUrl",
            Self::NegativePrice => "pricePerTonneCents",
            Self::EmptySupply | Self::RemainingExceedsTonnes => "tonnes",
        }
    }
}

impl fmt::Display for OffsetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyProjectName => write!(f, "project name must not be empty"),
            Self::ProjectNameTooLong { max } => {
                write!(f, "project name must be at most {max} characters")
            }
            Self::DescriptionTooLong { max } => {
                write!(f, "offset description must be at most {max} characters")
            }
            Self::LocationTooLong { max } => write!(f, "location must be at most {max} characters"),
            Self::InvalidSourceUrl => write!(f, "source URL must be an absolute URL"),
            Self::UnsupportedSourceScheme { scheme } => {
                write!(f, "source URL scheme `{scheme}` is not http or https")
            }
            Self::NegativePrice => write!(f, "price per tonne must not be negative"),
            Self::EmptySupply => write!(f, "offset must provide at least one kilogram"),
            Self::RemainingExceedsTonnes => {
                write!(f, "remaining quantity cannot exceed the original tonnes")
            }
        }
    }
}

impl std::error::Error for OffsetValidationError {}

/// Provenance link for an offset project; always http or https.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(Url);

impl SourceUrl {
    /// Parse and validate a provenance URL.
    ///
    /// # Examples
    /// ```
    /// use carbontrack::domain::offsets::SourceUrl;
    ///
    /// assert!(SourceUrl::parse("https://registry.example.org/p/42").is_ok());
    /// assert!(SourceUrl::parse("ftp://registry.example.org/p/42").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, OffsetValidationError> {
        let url = Url::parse(raw.trim()).map_err(|_| OffsetValidationError::InvalidSourceUrl)?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(OffsetValidationError::UnsupportedSourceScheme {
                scheme: other.to_owned(),
            }),
        }
    }

    /// URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated offset registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffset {
    project_name: String,
    description: String,
    location: Option<String>,
    source_url: SourceUrl,
    price_per_tonne_cents: u64,
    tonnes: CarbonMass,
}

/// Raw offset registration fields.
#[derive(Debug, Clone, Copy)]
pub struct NewOffsetFields<'a> {
    pub project_name: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub source_url: &'a str,
    pub price_per_tonne_cents: i64,
    pub tonnes: CarbonMass,
}

impl NewOffset {
    /// Validate registration fields.
    pub fn try_from_fields(fields: NewOffsetFields<'_>) -> Result<Self, OffsetValidationError> {
        let project_name = fields.project_name.trim();
        if project_name.is_empty() {
            return Err(OffsetValidationError::EmptyProjectName);
        }
        if project_name.chars().count() > PROJECT_NAME_MAX {
            return Err(OffsetValidationError::ProjectNameTooLong {
                max: PROJECT_NAME_MAX,
            });
        }
        let description = fields.description.trim();
        if description.chars().count() > OFFSET_DESCRIPTION_MAX {
            return Err(OffsetValidationError::DescriptionTooLong {
                max: OFFSET_DESCRIPTION_MAX,
            });
        }
        let location = fields.location.map(str::trim).filter(|value| !value.is_empty());
        if location.is_some_and(|value| value.chars().count() > LOCATION_MAX) {
            return Err(OffsetValidationError::LocationTooLong { max: LOCATION_MAX });
        }
        let source_url = SourceUrl::parse(fields.source_url)?;
        let price_per_tonne_cents = u64::try_from(fields.price_per_tonne_cents)
            .map_err(|_| OffsetValidationError::NegativePrice)?;
        if fields.tonnes.is_zero() {
            return Err(OffsetValidationError::EmptySupply);
        }
        Ok(Self {
            project_name: project_name.to_owned(),
            description: description.to_owned(),
            location: location.map(str::to_owned),
            source_url,
            price_per_tonne_cents,
            tonnes: fields.tonnes,
        })
    }

    /// Project name.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Project description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Project location.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Provenance link.
    pub fn source_url(&self) -> &SourceUrl {
        &self.source_url
    }

    /// Price in cents per tonne.
    pub fn price_per_tonne_cents(&self) -> u64 {
        self.price_per_tonne_cents
    }

    /// Registered supply.
    pub fn tonnes(&self) -> CarbonMass {
        self.tonnes
    }
}

/// Registered offset with its current remaining supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    id: OffsetId,
    details: NewOffset,
    remaining: CarbonMass,
    created_at: DateTime<Utc>,
}

impl Offset {
    /// Assemble a stored offset, checking `remaining <= tonnes`.
    pub fn new(
        id: OffsetId,
        details: NewOffset,
        remaining: CarbonMass,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OffsetValidationError> {
        if remaining > details.tonnes {
            return Err(OffsetValidationError::RemainingExceedsTonnes);
        }
        Ok(Self {
            id,
            details,
            remaining,
            created_at,
        })
    }

    /// Stable identifier.
    pub fn id(&self) -> OffsetId {
        self.id
    }

    /// Registration details.
    pub fn details(&self) -> &NewOffset {
        &self.details
    }

    /// Original supply.
    pub fn tonnes(&self) -> CarbonMass {
        self.details.tonnes
    }

    /// Supply still available.
    pub fn remaining(&self) -> CarbonMass {
        self.remaining
    }

    /// Supply already allocated.
    pub fn allocated(&self) -> CarbonMass {
        self.details.tonnes.saturating_sub(self.remaining)
    }

    /// Price in cents per tonne.
    pub fn price_per_tonne_cents(&self) -> u64 {
        self.details.price_per_tonne_cents
    }

    /// Registration timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether no supply is left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Decrement the remaining supply. Returns `false`, leaving the offset
    /// untouched, when `quantity` exceeds what is left.
    pub(crate) fn consume(&mut self, quantity: CarbonMass) -> bool {
        match self.remaining.checked_sub(quantity) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => false,
        }
    }
}

/// Ledger row: `quantity` of `offset_id` consumed for `product_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetAllocationEntry {
    pub id: AllocationEntryId,
    pub product_id: ProductId,
    pub offset_id: OffsetId,
    pub quantity: CarbonMass,
    pub created_at: DateTime<Utc>,
}
