//! Prometheus adapter for offset allocation outcomes.

use async_trait::async_trait;
use prometheus::{Counter, IntCounterVec, Opts, Registry};

use crate::domain::CarbonMass;
use crate::domain::ports::{AllocationMetrics, AllocationMetricsError, AllocationOutcome};

/// Prometheus-backed recorder for allocation attempts.
pub struct PrometheusAllocationMetrics {
    allocations_total: IntCounterVec,
    allocated_tonnes_total: Counter,
}

impl PrometheusAllocationMetrics {
    /// Create and register the counters with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when Prometheus rejects metric registration.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let allocations_total = IntCounterVec::new(
            Opts::new(
                "offset_allocations_total",
                "Offset allocation attempts by outcome",
            ),
            &["outcome"],
        )?;
        let allocated_tonnes_total = Counter::with_opts(Opts::new(
            "offset_allocated_tonnes_total",
            "Tonnes of CO2e drawn from offsets",
        ))?;
        registry.register(Box::new(allocations_total.clone()))?;
        registry.register(Box::new(allocated_tonnes_total.clone()))?;
        Ok(Self {
            allocations_total,
            allocated_tonnes_total,
        })
    }
}

#[async_trait]
impl AllocationMetrics for PrometheusAllocationMetrics {
    async fn record(
        &self,
        outcome: AllocationOutcome,
        allocated: CarbonMass,
    ) -> Result<(), AllocationMetricsError> {
        self.allocations_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.allocated_tonnes_total.inc_by(allocated.as_tonnes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn make_metrics() -> (Registry, PrometheusAllocationMetrics) {
        let registry = Registry::new();
        let metrics =
            PrometheusAllocationMetrics::new(&registry).expect("metric registration should succeed");
        (registry, metrics)
    }

    #[test]
    fn registers_counters_with_registry() {
        let (registry, _metrics) = make_metrics();
        let families = registry.gather();
        for name in ["offset_allocations_total", "offset_allocated_tonnes_total"] {
            assert!(
                families.iter().any(|family| family.name() == name),
                "{name} should be registered"
            );
        }
    }

    #[rstest]
    #[case(AllocationOutcome::Covered)]
    #[case(AllocationOutcome::Partial)]
    #[case(AllocationOutcome::Rejected)]
    #[tokio::test]
    async fn records_outcome_label(#[case] outcome: AllocationOutcome) {
        let (_registry, metrics) = make_metrics();
        metrics
            .record(outcome, CarbonMass::from_kilograms(2_500))
            .await
            .expect("recording should not fail");

        let counter = metrics
            .allocations_total
            .with_label_values(&[outcome.as_str()]);
        assert_eq!(counter.get(), 1);
        assert!((metrics.allocated_tonnes_total.get() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn registering_twice_fails() {
        let registry = Registry::new();
        PrometheusAllocationMetrics::new(&registry).expect("first registration");
        assert!(PrometheusAllocationMetrics::new(&registry).is_err());
    }
}
