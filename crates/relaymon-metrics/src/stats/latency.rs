use super::successful_latencies;
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    pub average_latency_ms: f64,
    pub median_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
}

/// Linear-interpolated percentile of an ascending slice.
///
/// `p` is a fraction in `[0, 1]`. Interpolates between ranks
/// `floor(p * (n - 1))` and `ceil(p * (n - 1))`.
///
/// # Examples
///
/// ```
/// use relaymon_metrics::stats::percentile;
///
/// let values = [10.0, 20.0, 30.0, 40.0];
/// assert_eq!(percentile(&values, 0.0), 10.0);
/// assert_eq!(percentile(&values, 1.0), 40.0);
/// assert_eq!(percentile(&values, 0.5), 25.0);
/// assert_eq!(percentile(&[], 0.5), 0.0);
/// ```
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        1 => sorted[0],
        _ => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Latency statistics over successful observations only.
pub fn calculate_latency_metrics(observations: &[Observation]) -> LatencyMetrics {
    let mut latencies = successful_latencies(observations);
    if latencies.is_empty() {
        return LatencyMetrics::default();
    }
    latencies.sort_by(f64::total_cmp);

    let n = latencies.len();
    let average = latencies.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        latencies[n / 2]
    } else {
        (latencies[n / 2 - 1] + latencies[n / 2]) / 2.0
    };

    LatencyMetrics {
        average_latency_ms: average,
        median_latency_ms: median,
        min_latency_ms: latencies[0],
        max_latency_ms: latencies[n - 1],
        p95_latency_ms: percentile(&latencies, 0.95),
        p99_latency_ms: percentile(&latencies, 0.99),
    }
}
