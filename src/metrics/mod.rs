//! Metrics for connection health
//!
//! Counters are recorded through the `metrics` facade; install a recorder
//! (for example a Prometheus exporter) in the host application to collect them.

pub mod counters;
pub mod labels;
