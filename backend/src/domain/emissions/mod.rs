//! Product emissions estimation.
//!
//! The estimator is a pure function of a product's inputs and an injected
//! [`EmissionFactors`] table:
//!
//! ```text
//! kg CO2e = Σ mass_kg × material_factor
//!         + energy_kwh × grid_factor
//!         + Σ (total_mass_t × distance_km × mode_factor)
//! ```
//!
//! The sum is rounded to the nearest kilogram.

mod factors;
mod inputs;

use std::fmt;

use thiserror::Error;

use super::{CarbonMass, QuantityError};

pub use factors::EmissionFactors;
pub use inputs::{
    EmissionInputs, EmissionInputsDraft, Material, MaterialDraft, MaterialInput, TransportLeg,
    TransportLegDraft, TransportMode,
};

/// What is wrong with an estimator input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputIssue {
    Missing,
    Negative,
    NotFinite,
    Empty,
    OutOfRange,
    Unsupported,
}

impl InputIssue {
    /// Machine-readable reason reported to callers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Negative => "negative",
            Self::NotFinite => "not_finite",
            Self::Empty => "empty",
            Self::OutOfRange => "out_of_range",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for InputIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<QuantityError> for InputIssue {
    fn from(value: QuantityError) -> Self {
        match value {
            QuantityError::Negative => Self::Negative,
            QuantityError::NotFinite => Self::NotFinite,
            QuantityError::OutOfRange => Self::OutOfRange,
        }
    }
}

/// Estimation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationError {
    /// A required field is absent or holds an unusable value.
    #[error("invalid estimator input `{field}`: {reason}")]
    InvalidInput { field: String, reason: InputIssue },
}

impl EstimationError {
    /// Build an [`EstimationError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, reason: InputIssue) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason,
        }
    }

    /// Path of the offending field, for example `materials[1].massKg`.
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }

    /// Reason the field was rejected.
    pub fn reason(&self) -> InputIssue {
        match self {
            Self::InvalidInput { reason, .. } => *reason,
        }
    }
}

/// Deterministic product footprint estimator.
///
/// # Examples
/// ```
/// use carbontrack::domain::emissions::{EmissionInputsDraft, EmissionsEstimator, MaterialDraft};
///
/// let estimator = EmissionsEstimator::default();
/// let draft = EmissionInputsDraft {
///     materials: Some(vec![MaterialDraft {
///         material: Some("steel".into()),
///         mass_kg: Some(100.0),
///     }]),
///     energy_kwh: Some(0.0),
///     transport: Some(vec![]),
/// };
/// let (_, estimate) = estimator.estimate_draft(draft).expect("valid inputs");
/// assert_eq!(estimate.kilograms(), 190);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmissionsEstimator {
    factors: EmissionFactors,
}

impl EmissionsEstimator {
    /// Build an estimator over a custom factor table.
    pub fn new(factors: EmissionFactors) -> Self {
        Self { factors }
    }

    /// Factor table in use.
    pub fn factors(&self) -> &EmissionFactors {
        &self.factors
    }

    /// Estimate the footprint of validated inputs.
    pub fn estimate(&self, inputs: &EmissionInputs) -> Result<CarbonMass, EstimationError> {
        let materials: f64 = inputs
            .materials()
            .iter()
            .map(|line| line.mass_kg * self.factors.material(line.material))
            .sum();
        let energy = inputs.energy_kwh() * self.factors.grid_kg_per_kwh();
        let mass_tonnes = inputs.total_mass_kg() / 1_000.0;
        let transport: f64 = inputs
            .transport()
            .iter()
            .map(|leg| mass_tonnes * leg.distance_km * self.factors.transport(leg.mode))
            .sum();

        CarbonMass::try_from_kilograms_f64(materials + energy + transport)
            .map_err(|err| EstimationError::invalid_input("inputs", err.into()))
    }

    /// Validate a draft and estimate it in one step.
    pub fn estimate_draft(
        &self,
        draft: EmissionInputsDraft,
    ) -> Result<(EmissionInputs, CarbonMass), EstimationError> {
        let inputs = EmissionInputs::try_from(draft)?;
        let estimate = self.estimate(&inputs)?;
        Ok((inputs, estimate))
    }
}
