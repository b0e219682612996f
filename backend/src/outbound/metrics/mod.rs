//! Prometheus-backed implementations of domain metrics ports.
//!
//! Feature-gated behind `metrics`.

mod prometheus_allocation;

pub use prometheus_allocation::PrometheusAllocationMetrics;
