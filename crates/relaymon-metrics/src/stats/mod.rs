//! Pure statistics calculators over a slice of observations.
//!
//! None of these functions hold state; they are recomputed from the window
//! on every cycle.

pub mod errors;
pub mod gas;
pub mod latency;
pub mod throughput;
pub mod timing;

pub use errors::{calculate_error_summary, ErrorSummary};
pub use gas::{calculate_gas_metrics, GasMetrics};
pub use latency::{calculate_latency_metrics, percentile, LatencyMetrics};
pub use throughput::{calculate_throughput_metrics, ThroughputMetrics};
pub use timing::{calculate_timing_metrics, TimingMetrics, TimingStatus};

use relaymon_common::types::Observation;

/// Latencies of successful observations, in arrival order.
pub(crate) fn successful_latencies(observations: &[Observation]) -> Vec<f64> {
    observations
        .iter()
        .filter(|o| o.success)
        .filter_map(|o| o.latency_ms)
        .collect()
}
