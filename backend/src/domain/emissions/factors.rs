//! Emission factor table.

use super::{Material, TransportMode};
use crate::domain::QuantityError;

/// Conversion factors used by the estimator.
///
/// - material factors are kg CO2e per kg of material produced;
/// - the grid factor is kg CO2e per kWh of electricity;
/// - transport factors are kg CO2e per tonne-kilometre.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionFactors {
    materials: [f64; Material::ALL.len()],
    grid_kg_per_kwh: f64,
    transport: [f64; TransportMode::ALL.len()],
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            // Aluminium, steel, plastic, glass, paper, cotton, wood, food.
            materials: [8.6, 1.9, 3.1, 0.9, 1.1, 5.9, 0.3, 2.5],
            grid_kg_per_kwh: 0.233,
            // Road, rail, sea, air.
            transport: [0.105, 0.028, 0.016, 0.602],
        }
    }
}

fn check_factor(value: f64) -> Result<f64, QuantityError> {
    if !value.is_finite() {
        return Err(QuantityError::NotFinite);
    }
    if value < 0.0 {
        return Err(QuantityError::Negative);
    }
    Ok(value)
}

impl EmissionFactors {
    /// Production factor for `material`.
    pub fn material(&self, material: Material) -> f64 {
        self.materials[material.index()]
    }

    /// Electricity grid intensity.
    pub fn grid_kg_per_kwh(&self) -> f64 {
        self.grid_kg_per_kwh
    }

    /// Freight factor for `mode`.
    pub fn transport(&self, mode: TransportMode) -> f64 {
        self.transport[mode.index()]
    }

    /// Replace one material factor.
    pub fn with_material(mut self, material: Material, kg_per_kg: f64) -> Result<Self, QuantityError> {
        self.materials[material.index()] = check_factor(kg_per_kg)?;
        Ok(self)
    }

    /// Replace the grid intensity.
    pub fn with_grid(mut self, kg_per_kwh: f64) -> Result<Self, QuantityError> {
        self.grid_kg_per_kwh = check_factor(kg_per_kwh)?;
        Ok(self)
    }

    /// Replace one freight factor.
    pub fn with_transport(mut self, mode: TransportMode, kg_per_tonne_km: f64) -> Result<Self, QuantityError> {
        self.transport[mode.index()] = check_factor(kg_per_tonne_km)?;
        Ok(self)
    }
}
