use crate::config::MetricsConfig;
use crate::stats::{LatencyMetrics, ThroughputMetrics};
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

/// Discrete operational status of the monitored relay path.
///
/// # Examples
///
/// ```
/// use relaymon_metrics::status::OperationalStatus;
///
/// let status: OperationalStatus = "degraded".parse().unwrap();
/// assert_eq!(status, OperationalStatus::Degraded);
/// assert_eq!(status.to_string(), "DEGRADED");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    Active,
    Degraded,
    Down,
    #[default]
    Unknown,
}

impl OperationalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Degraded => "DEGRADED",
            Self::Down => "DOWN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "DEGRADED" => Ok(Self::Degraded),
            "DOWN" => Ok(Self::Down),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(format!("unknown operational status: {s}")),
        }
    }
}

/// True when the trailing `threshold` observations are all failures, or
/// when fewer than `threshold` observations exist and every one failed.
/// A threshold of zero disables the check.
pub fn has_consecutive_failures(observations: &[Observation], threshold: usize) -> bool {
    if observations.is_empty() || threshold == 0 {
        return false;
    }
    let start = observations.len().saturating_sub(threshold);
    observations[start..].iter().all(|o| !o.success)
}

/// Number of failures at the tail of the window, stopping at the most
/// recent success.
pub fn consecutive_failure_count(observations: &[Observation]) -> usize {
    observations.iter().rev().take_while(|o| !o.success).count()
}

/// Derives the operational status.
///
/// The consecutive-failure check runs first and overrides everything else,
/// then the critical thresholds (any match is `DOWN`), then the healthy
/// thresholds (any match is `DEGRADED`).
pub fn determine_operational_status(
    throughput: &ThroughputMetrics,
    latency: &LatencyMetrics,
    config: &MetricsConfig,
    observations: &[Observation],
) -> OperationalStatus {
    if throughput.total_messages == 0 {
        return OperationalStatus::Unknown;
    }

    if has_consecutive_failures(observations, config.consecutive_failure_threshold) {
        return OperationalStatus::Down;
    }

    let failure_rate = 100.0 - throughput.success_rate;

    if throughput.success_rate == 0.0
        || throughput.success_rate < config.critical_success_rate_threshold
        || latency.average_latency_ms > config.critical_latency_ms
        || failure_rate > config.critical_failure_rate_threshold
    {
        return OperationalStatus::Down;
    }

    if throughput.success_rate < config.healthy_success_rate_threshold
        || latency.average_latency_ms > config.max_healthy_latency_ms
        || failure_rate > config.max_healthy_failure_rate_threshold
    {
        return OperationalStatus::Degraded;
    }

    OperationalStatus::Active
}
