use super::successful_latencies;
use crate::config::MetricsConfig;
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimingStatus {
    #[default]
    OnTime,
    Delayed,
    SeverelyDelayed,
}

impl TimingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTime => "ON_TIME",
            Self::Delayed => "DELAYED",
            Self::SeverelyDelayed => "SEVERELY_DELAYED",
        }
    }

    fn classify(latency_ms: f64, config: &MetricsConfig) -> Self {
        if latency_ms <= config.delay_threshold_ms {
            Self::OnTime
        } else if latency_ms <= config.severe_delay_threshold_ms {
            Self::Delayed
        } else {
            Self::SeverelyDelayed
        }
    }
}

impl std::fmt::Display for TimingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingMetrics {
    pub on_time_messages: u64,
    pub delayed_messages: u64,
    pub severely_delayed_messages: u64,
    pub average_delay_ms: f64,
    pub timing_status: TimingStatus,
}

/// Buckets successful latencies against the delay thresholds.
///
/// The aggregate status is `SEVERELY_DELAYED` when more than 10% of points
/// are severely delayed, else `DELAYED` when more than 20% are delayed.
pub fn calculate_timing_metrics(observations: &[Observation], config: &MetricsConfig) -> TimingMetrics {
    let latencies = successful_latencies(observations);
    if latencies.is_empty() {
        return TimingMetrics::default();
    }

    let mut metrics = TimingMetrics::default();
    for &latency in &latencies {
        match TimingStatus::classify(latency, config) {
            TimingStatus::OnTime => metrics.on_time_messages += 1,
            TimingStatus::Delayed => metrics.delayed_messages += 1,
            TimingStatus::SeverelyDelayed => metrics.severely_delayed_messages += 1,
        }
    }

    let n = latencies.len() as f64;
    metrics.average_delay_ms = latencies.iter().sum::<f64>() / n;
    metrics.timing_status = if metrics.severely_delayed_messages as f64 > n * 0.1 {
        TimingStatus::SeverelyDelayed
    } else if metrics.delayed_messages as f64 > n * 0.2 {
        TimingStatus::Delayed
    } else {
        TimingStatus::OnTime
    };
    metrics
}
