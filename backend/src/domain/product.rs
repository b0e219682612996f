//! Products and their derived footprint.
//!
//! `estimated_emissions` is never accepted from callers: it is produced by the
//! [`EmissionsEstimator`](super::emissions::EmissionsEstimator) whenever the
//! inputs are set, so a stored product always carries the estimate of its
//! stored inputs.

use std::fmt;

use chrono::{DateTime, Utc};

use super::emissions::EmissionInputs;
use super::record_id::define_record_id;
use super::{CarbonMass, UserId};

define_record_id! {
    /// Stable product identifier (database primary key).
    ProductId
}

/// Maximum product name length.
pub const PRODUCT_NAME_MAX: usize = 120;
/// Maximum product description length.
pub const PRODUCT_DESCRIPTION_MAX: usize = 2_000;
/// Maximum category length.
pub const PRODUCT_CATEGORY_MAX: usize = 64;

/// Validation errors for product fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyName,
    NameTooLong { max: usize },
    DescriptionTooLong { max: usize },
    CategoryTooLong { max: usize },
}

impl ProductValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooLong { .. } => "name",
            Self::DescriptionTooLong { .. } => "description",
            Self::CategoryTooLong { .. } => "category",
        }
    }
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "product name must not be empty"),
            Self::NameTooLong { max } => write!(f, "product name must be at most {max} characters"),
            Self::DescriptionTooLong { max } => {
                write!(f, "product description must be at most {max} characters")
            }
            Self::CategoryTooLong { max } => {
                write!(f, "product category must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ProductValidationError {}

/// Descriptive product fields, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    name: String,
    description: String,
    category: Option<String>,
}

impl ProductDetails {
    /// Validate descriptive fields. Blank categories are treated as absent.
    ///
    /// # Examples
    /// ```
    /// use carbontrack::domain::ProductDetails;
    ///
    /// let details = ProductDetails::new(" Bottle ", "Reusable", Some("  ")).expect("valid");
    /// assert_eq!(details.name(), "Bottle");
    /// assert_eq!(details.category(), None);
    /// ```
    pub fn new(
        name: impl AsRef<str>,
        description: impl AsRef<str>,
        category: Option<&str>,
    ) -> Result<Self, ProductValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        if name.chars().count() > PRODUCT_NAME_MAX {
            return Err(ProductValidationError::NameTooLong {
                max: PRODUCT_NAME_MAX,
            });
        }
        let description = description.as_ref().trim();
        if description.chars().count() > PRODUCT_DESCRIPTION_MAX {
            return Err(ProductValidationError::DescriptionTooLong {
                max: PRODUCT_DESCRIPTION_MAX,
            });
        }
        let category = category.map(str::trim).filter(|value| !value.is_empty());
        if category.is_some_and(|value| value.chars().count() > PRODUCT_CATEGORY_MAX) {
            return Err(ProductValidationError::CategoryTooLong {
                max: PRODUCT_CATEGORY_MAX,
            });
        }
        Ok(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            category: category.map(str::to_owned),
        })
    }

    /// Product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description, possibly empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Optional category label.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Product ready to be stored, with its estimate already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub owner_id: UserId,
    pub details: ProductDetails,
    pub inputs: EmissionInputs,
    pub estimated_emissions: CarbonMass,
}

/// Stored product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub owner_id: UserId,
    pub details: ProductDetails,
    pub inputs: EmissionInputs,
    pub estimated_emissions: CarbonMass,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-product view of estimated and offset emissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionsSummary {
    pub product_id: ProductId,
    pub owner_id: UserId,
    pub estimated: CarbonMass,
    pub offset: CarbonMass,
    pub updated_at: DateTime<Utc>,
}

impl EmissionsSummary {
    /// Emissions not yet covered by allocations, never below zero.
    pub fn outstanding(&self) -> CarbonMass {
        self.estimated.saturating_sub(self.offset)
    }
}
