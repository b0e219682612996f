//! CO2-equivalent mass quantities.
//!
//! Masses are held as whole kilograms so allocation arithmetic stays exact.
//! Adapters exchange them as decimal tonnes.

use std::fmt;

use serde::{Deserialize, Serialize};

const KILOGRAMS_PER_TONNE: u64 = 1_000;

/// Largest mass accepted anywhere in the system (one billion tonnes).
///
/// Keeps every value exactly representable as an `f64` and as a PostgreSQL
/// `BIGINT`.
pub const MAX_KILOGRAMS: u64 = 1_000_000_000_000;

/// Reasons a raw number cannot become a [`CarbonMass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    Negative,
    NotFinite,
    OutOfRange,
}

impl QuantityError {
    /// Short machine-readable reason used in error details.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::NotFinite => "not_finite",
            Self::OutOfRange => "out_of_range",
        }
    }
}

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "quantity must not be negative"),
            Self::NotFinite => write!(f, "quantity must be a finite number"),
            Self::OutOfRange => write!(f, "quantity exceeds the supported range"),
        }
    }
}

impl std::error::Error for QuantityError {}

/// Non-negative mass of CO2 equivalent.
///
/// # Examples
/// ```
/// use carbontrack::domain::CarbonMass;
///
/// let mass = CarbonMass::try_from_tonnes(6.5).expect("valid tonnes");
/// assert_eq!(mass.kilograms(), 6_500);
/// assert_eq!(mass.as_tonnes(), 6.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CarbonMass(u64);

impl CarbonMass {
    /// The empty mass.
    pub const ZERO: Self = Self(0);

    /// Build a mass from whole kilograms, clamping at [`MAX_KILOGRAMS`].
    #[must_use]
    pub const fn from_kilograms(kilograms: u64) -> Self {
        if kilograms > MAX_KILOGRAMS {
            Self(MAX_KILOGRAMS)
        } else {
            Self(kilograms)
        }
    }

    /// Build a mass from whole tonnes, clamping at [`MAX_KILOGRAMS`].
    #[must_use]
    pub const fn from_whole_tonnes(tonnes: u64) -> Self {
        Self::from_kilograms(tonnes.saturating_mul(KILOGRAMS_PER_TONNE))
    }

    /// Convert decimal tonnes, rounding to the nearest kilogram.
    pub fn try_from_tonnes(tonnes: f64) -> Result<Self, QuantityError> {
        Self::try_from_kilograms_f64(tonnes * 1_000.0)
    }

    /// Convert a fractional kilogram count, rounding to the nearest kilogram.
    pub fn try_from_kilograms_f64(kilograms: f64) -> Result<Self, QuantityError> {
        if !kilograms.is_finite() {
            return Err(QuantityError::NotFinite);
        }
        if kilograms < 0.0 {
            return Err(QuantityError::Negative);
        }
        let rounded = kilograms.round();
        #[expect(
            clippy::cast_precision_loss,
            reason = "MAX_KILOGRAMS is far below 2^53 so the bound is exact"
        )]
        let max = MAX_KILOGRAMS as f64;
        if rounded > max {
            return Err(QuantityError::OutOfRange);
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "value is finite, non-negative and bounded by MAX_KILOGRAMS"
        )]
        let whole = rounded as u64;
        Ok(Self(whole))
    }

    /// Whole kilograms.
    #[must_use]
    pub const fn kilograms(self) -> u64 {
        self.0
    }

    /// Decimal tonnes.
    #[must_use]
    pub fn as_tonnes(self) -> f64 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "values are bounded by MAX_KILOGRAMS which is exact in f64"
        )]
        let kilograms = self.0 as f64;
        kilograms / 1_000.0
    }

    /// Whether the mass is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add two masses, clamping at [`MAX_KILOGRAMS`].
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self::from_kilograms(self.0.saturating_add(other.0))
    }

    /// Subtract `other`, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Subtract `other`, returning `None` when it would go below zero.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl TryFrom<f64> for CarbonMass {
    type Error = QuantityError;

    fn try_from(tonnes: f64) -> Result<Self, Self::Error> {
        Self::try_from_tonnes(tonnes)
    }
}

impl From<CarbonMass> for f64 {
    fn from(value: CarbonMass) -> Self {
        value.as_tonnes()
    }
}

impl std::iter::Sum for CarbonMass {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for CarbonMass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} t CO2e", self.as_tonnes())
    }
}
