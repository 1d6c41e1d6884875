use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    pub total_messages: u64,
    pub successful_messages: u64,
    pub failed_messages: u64,
    /// Percentage in `[0, 100]`; zero for an empty window.
    pub success_rate: f64,
    pub messages_per_hour: f64,
}

const MS_PER_HOUR: f64 = 3_600_000.0;

pub fn calculate_throughput_metrics(observations: &[Observation]) -> ThroughputMetrics {
    let total = observations.len() as u64;
    let successful = observations.iter().filter(|o| o.success).count() as u64;
    let failed = total - successful;
    let success_rate = if total > 0 {
        successful as f64 * 100.0 / total as f64
    } else {
        0.0
    };

    let span_ms = if observations.len() > 1 {
        let first = observations.iter().map(|o| o.timestamp).min();
        let last = observations.iter().map(|o| o.timestamp).max();
        match (first, last) {
            (Some(first), Some(last)) => (last - first).num_milliseconds(),
            _ => 0,
        }
    } else {
        0
    };

    let messages_per_hour = if span_ms > 0 {
        total as f64 / span_ms as f64 * MS_PER_HOUR
    } else {
        0.0
    };

    ThroughputMetrics {
        total_messages: total,
        successful_messages: successful,
        failed_messages: failed,
        success_rate,
        messages_per_hour,
    }
}
