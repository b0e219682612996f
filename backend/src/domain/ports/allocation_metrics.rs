//! Domain port for recording allocation outcomes.
//!
//! Implementations may export to Prometheus or discard the events entirely.

use async_trait::async_trait;

use crate::domain::CarbonMass;

use super::define_port_error;

define_port_error! {
    /// Errors exposed when recording allocation metrics.
    pub enum AllocationMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "allocation metrics exporter failed: {message}",
    }
}

/// Result category of one allocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// Target fully covered.
    Covered,
    /// Some supply allocated, shortfall remains.
    Partial,
    /// Rejected for insufficient supply.
    Rejected,
}

impl AllocationOutcome {
    /// Label value used by exporters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Covered => "covered",
            Self::Partial => "partial",
            Self::Rejected => "rejected",
        }
    }
}

#[async_trait]
pub trait AllocationMetrics: Send + Sync {
    /// Record one allocation attempt and the quantity it moved.
    async fn record(
        &self,
        outcome: AllocationOutcome,
        allocated: CarbonMass,
    ) -> Result<(), AllocationMetricsError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAllocationMetrics;

#[async_trait]
impl AllocationMetrics for NoOpAllocationMetrics {
    async fn record(
        &self,
        _outcome: AllocationOutcome,
        _allocated: CarbonMass,
    ) -> Result<(), AllocationMetricsError> {
        Ok(())
    }
}
