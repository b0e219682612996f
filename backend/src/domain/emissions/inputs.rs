//! Estimator input model.
//!
//! Callers hand the domain an [`EmissionInputsDraft`], where every field is
//! optional so that absent values can be reported precisely. Validation turns
//! it into [`EmissionInputs`], which is what products store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EstimationError, InputIssue};

/// Material categories with a known production footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Aluminium,
    Steel,
    Plastic,
    Glass,
    Paper,
    Cotton,
    Wood,
    Food,
}

impl Material {
    /// Every supported material, in factor-table order.
    pub const ALL: [Self; 8] = [
        Self::Aluminium,
        Self::Steel,
        Self::Plastic,
        Self::Glass,
        Self::Paper,
        Self::Cotton,
        Self::Wood,
        Self::Food,
    ];

    /// Wire name of the material.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aluminium => "aluminium",
            Self::Steel => "steel",
            Self::Plastic => "plastic",
            Self::Glass => "glass",
            Self::Paper => "paper",
            Self::Cotton => "cotton",
            Self::Wood => "wood",
            Self::Food => "food",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = InputIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|material| material.as_str() == s)
            .ok_or(InputIssue::Unsupported)
    }
}

/// Freight modes with a per tonne-kilometre factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Road,
    Rail,
    Sea,
    Air,
}

impl TransportMode {
    /// Every supported mode, in factor-table order.
    pub const ALL: [Self; 4] = [Self::Road, Self::Rail, Self::Sea, Self::Air];

    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Rail => "rail",
            Self::Sea => "sea",
            Self::Air => "air",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = InputIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or(InputIssue::Unsupported)
    }
}

/// One material line of a product's bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInput {
    pub material: Material,
    pub mass_kg: f64,
}

/// One freight leg moving the whole product mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportLeg {
    pub mode: TransportMode,
    pub distance_km: f64,
}

/// Validated estimator inputs.
///
/// ## Invariants
/// - `materials` is non-empty.
/// - Every numeric field is finite and non-negative.
///
/// Deserialisation re-runs validation, so stored inputs cannot bypass it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "EmissionInputsDraft")]
pub struct EmissionInputs {
    materials: Vec<MaterialInput>,
    energy_kwh: f64,
    transport: Vec<TransportLeg>,
}

impl EmissionInputs {
    /// Material lines.
    pub fn materials(&self) -> &[MaterialInput] {
        &self.materials
    }

    /// Manufacturing electricity in kilowatt-hours.
    pub fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    /// Freight legs.
    pub fn transport(&self) -> &[TransportLeg] {
        &self.transport
    }

    /// Total material mass in kilograms.
    pub fn total_mass_kg(&self) -> f64 {
        self.materials.iter().map(|line| line.mass_kg).sum()
    }
}

/// Unvalidated material line as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDraft {
    /// One of `aluminium`, `steel`, `plastic`, `glass`, `paper`, `cotton`,
    /// `wood`, `food`.
    #[serde(default)]
    #[schema(example = "steel")]
    pub material: Option<String>,
    /// Mass in kilograms.
    #[serde(default)]
    #[schema(example = 12.5)]
    pub mass_kg: Option<f64>,
}

/// Unvalidated freight leg as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransportLegDraft {
    /// One of `road`, `rail`, `sea`, `air`.
    #[serde(default)]
    #[schema(example = "sea")]
    pub mode: Option<String>,
    /// Distance in kilometres.
    #[serde(default)]
    #[schema(example = 8000.0)]
    pub distance_km: Option<f64>,
}

/// Unvalidated estimator inputs, also the JSON body of the input endpoints.
///
/// Every field is optional on the wire so missing values are reported by the
/// estimator with a precise field path rather than as a parse failure.
///
/// # Examples
/// ```
/// use carbontrack::domain::emissions::{EmissionInputs, EmissionInputsDraft, MaterialDraft};
///
/// let draft = EmissionInputsDraft {
///     materials: Some(vec![MaterialDraft {
///         material: Some("steel".into()),
///         mass_kg: Some(12.5),
///     }]),
///     energy_kwh: Some(3.0),
///     transport: None,
/// };
/// let inputs = EmissionInputs::try_from(draft).expect("valid inputs");
/// assert_eq!(inputs.total_mass_kg(), 12.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmissionInputsDraft {
    /// Non-empty list of material lines.
    #[serde(default)]
    pub materials: Option<Vec<MaterialDraft>>,
    /// Electricity used in manufacture, in kWh.
    #[serde(default)]
    #[schema(example = 40.0)]
    pub energy_kwh: Option<f64>,
    /// Freight legs; each moves the total material mass.
    #[serde(default)]
    pub transport: Option<Vec<TransportLegDraft>>,
}

impl From<&EmissionInputs> for EmissionInputsDraft {
    fn from(value: &EmissionInputs) -> Self {
        Self {
            materials: Some(
                value
                    .materials
                    .iter()
                    .map(|line| MaterialDraft {
                        material: Some(line.material.as_str().to_owned()),
                        mass_kg: Some(line.mass_kg),
                    })
                    .collect(),
            ),
            energy_kwh: Some(value.energy_kwh),
            transport: Some(
                value
                    .transport
                    .iter()
                    .map(|leg| TransportLegDraft {
                        mode: Some(leg.mode.as_str().to_owned()),
                        distance_km: Some(leg.distance_km),
                    })
                    .collect(),
            ),
        }
    }
}

fn require_amount(field: impl FnOnce() -> String, value: Option<f64>) -> Result<f64, EstimationError> {
    let Some(value) = value else {
        return Err(EstimationError::invalid_input(field(), InputIssue::Missing));
    };
    if !value.is_finite() {
        return Err(EstimationError::invalid_input(field(), InputIssue::NotFinite));
    }
    if value < 0.0 {
        return Err(EstimationError::invalid_input(field(), InputIssue::Negative));
    }
    Ok(value)
}

fn require_kind<T>(field: impl Fn() -> String, value: Option<&str>) -> Result<T, EstimationError>
where
    T: FromStr<Err = InputIssue>,
{
    let raw = value.ok_or_else(|| EstimationError::invalid_input(field(), InputIssue::Missing))?;
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|issue| EstimationError::invalid_input(field(), issue))
}

impl TryFrom<EmissionInputsDraft> for EmissionInputs {
    type Error = EstimationError;

    fn try_from(draft: EmissionInputsDraft) -> Result<Self, Self::Error> {
        let raw_materials = draft
            .materials
            .ok_or_else(|| EstimationError::invalid_input("materials", InputIssue::Missing))?;
        if raw_materials.is_empty() {
            return Err(EstimationError::invalid_input("materials", InputIssue::Empty));
        }

        let materials = raw_materials
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                Ok(MaterialInput {
                    material: require_kind(
                        || format!("materials[{idx}].material"),
                        line.material.as_deref(),
                    )?,
                    mass_kg: require_amount(|| format!("materials[{idx}].massKg"), line.mass_kg)?,
                })
            })
            .collect::<Result<Vec<_>, EstimationError>>()?;

        let energy_kwh = require_amount(|| "energyKwh".to_owned(), draft.energy_kwh)?;

        let transport = draft
            .transport
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(idx, leg)| {
                Ok(TransportLeg {
                    mode: require_kind(|| format!("transport[{idx}].mode"), leg.mode.as_deref())?,
                    distance_km: require_amount(
                        || format!("transport[{idx}].distanceKm"),
                        leg.distance_km,
                    )?,
                })
            })
            .collect::<Result<Vec<_>, EstimationError>>()?;

        Ok(Self {
            materials,
            energy_kwh,
            transport,
        })
    }
}
