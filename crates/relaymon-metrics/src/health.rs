use crate::config::MetricsConfig;
use crate::stats::{LatencyMetrics, ThroughputMetrics};
use crate::status::{consecutive_failure_count, has_consecutive_failures};
use chrono::{DateTime, Utc};
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

/// Overall health, ordered from lowest to highest severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthLevel {
    #[default]
    Healthy,
    Warning,
    Critical,
    Emergency,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Emergency => "EMERGENCY",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthAlertKind {
    ConsecutiveFailures,
    CriticalFailureRate,
    HighFailureRate,
    LowSuccessRate,
    DegradedSuccessRate,
    CriticalLatency,
    HighLatency,
}

impl HealthAlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsecutiveFailures => "CONSECUTIVE_FAILURES",
            Self::CriticalFailureRate => "CRITICAL_FAILURE_RATE",
            Self::HighFailureRate => "HIGH_FAILURE_RATE",
            Self::LowSuccessRate => "LOW_SUCCESS_RATE",
            Self::DegradedSuccessRate => "DEGRADED_SUCCESS_RATE",
            Self::CriticalLatency => "CRITICAL_LATENCY",
            Self::HighLatency => "HIGH_LATENCY",
        }
    }

    pub fn is_failure_rate(&self) -> bool {
        matches!(self, Self::CriticalFailureRate | Self::HighFailureRate)
    }
}

impl std::fmt::Display for HealthAlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds and actual values that produced a health alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthAlertContext {
    pub threshold: f64,
    pub actual: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p95_latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99_latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_all_failures: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub level: HealthLevel,
    pub kind: HealthAlertKind,
    pub message: String,
    pub count: u64,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    pub context: HealthAlertContext,
}

/// Emits every applicable health alert. Kinds are independent: a window can
/// carry a consecutive-failure alert, a failure-rate alert and a latency
/// alert at once.
pub fn generate_health_alerts(
    observations: &[Observation],
    latency: &LatencyMetrics,
    throughput: &ThroughputMetrics,
    config: &MetricsConfig,
    now: DateTime<Utc>,
) -> Vec<HealthAlert> {
    let mut alerts = Vec::new();
    let failure_rate = 100.0 - throughput.success_rate;
    let failed: Vec<&Observation> = observations.iter().filter(|o| !o.success).collect();

    let span = |items: &[&Observation]| -> (DateTime<Utc>, DateTime<Utc>) {
        let first = items.iter().map(|o| o.timestamp).min().unwrap_or(now);
        let last = items.iter().map(|o| o.timestamp).max().unwrap_or(now);
        (first, last)
    };
    let (failed_first, failed_last) = span(&failed);

    let threshold = config.consecutive_failure_threshold;
    if has_consecutive_failures(observations, threshold) {
        let count = consecutive_failure_count(observations);
        let is_all_failures = observations.len() < threshold;
        let message = if is_all_failures {
            format!(
                "System is DOWN: All {} tracked attempts have failed",
                observations.len()
            )
        } else {
            format!("System is DOWN: {count} consecutive failures detected")
        };
        let (first, _) = span(&failed[failed.len().saturating_sub(count)..]);
        alerts.push(HealthAlert {
            level: HealthLevel::Critical,
            kind: HealthAlertKind::ConsecutiveFailures,
            message,
            count: count as u64,
            first_occurrence: first,
            last_occurrence: failed_last,
            context: HealthAlertContext {
                threshold: threshold as f64,
                actual: count as f64,
                failed_messages: Some(throughput.failed_messages),
                total_messages: Some(throughput.total_messages),
                is_all_failures: Some(is_all_failures),
                ..Default::default()
            },
        });
    }

    let rate_context = |threshold: f64, actual: f64| HealthAlertContext {
        threshold,
        actual,
        failed_messages: Some(throughput.failed_messages),
        total_messages: Some(throughput.total_messages),
        ..Default::default()
    };

    if failure_rate > config.critical_failure_rate_threshold {
        alerts.push(HealthAlert {
            level: HealthLevel::Critical,
            kind: HealthAlertKind::CriticalFailureRate,
            message: format!("Failure rate is critically high at {failure_rate:.1}%"),
            count: throughput.failed_messages,
            first_occurrence: failed_first,
            last_occurrence: failed_last,
            context: HealthAlertContext {
                success_rate: Some(throughput.success_rate),
                ..rate_context(config.critical_failure_rate_threshold, failure_rate)
            },
        });
    } else if failure_rate > config.max_healthy_failure_rate_threshold {
        alerts.push(HealthAlert {
            level: HealthLevel::Warning,
            kind: HealthAlertKind::HighFailureRate,
            message: format!("Failure rate is above healthy threshold at {failure_rate:.1}%"),
            count: throughput.failed_messages,
            first_occurrence: failed_first,
            last_occurrence: failed_last,
            context: HealthAlertContext {
                success_rate: Some(throughput.success_rate),
                ..rate_context(config.max_healthy_failure_rate_threshold, failure_rate)
            },
        });
    }

    if throughput.success_rate < config.critical_success_rate_threshold {
        alerts.push(HealthAlert {
            level: HealthLevel::Critical,
            kind: HealthAlertKind::LowSuccessRate,
            message: format!(
                "Success rate is critically low at {:.1}%",
                throughput.success_rate
            ),
            count: throughput.failed_messages,
            first_occurrence: failed_first,
            last_occurrence: failed_last,
            context: rate_context(config.critical_success_rate_threshold, throughput.success_rate),
        });
    } else if throughput.success_rate < config.healthy_success_rate_threshold {
        alerts.push(HealthAlert {
            level: HealthLevel::Warning,
            kind: HealthAlertKind::DegradedSuccessRate,
            message: format!(
                "Success rate is below healthy threshold at {:.1}%",
                throughput.success_rate
            ),
            count: throughput.failed_messages,
            first_occurrence: failed_first,
            last_occurrence: failed_last,
            context: HealthAlertContext {
                threshold: config.healthy_success_rate_threshold,
                actual: throughput.success_rate,
                ..Default::default()
            },
        });
    }

    if latency.average_latency_ms > config.critical_latency_ms {
        alerts.push(HealthAlert {
            level: HealthLevel::Critical,
            kind: HealthAlertKind::CriticalLatency,
            message: format!(
                "Average latency is critically high at {:.1}s",
                latency.average_latency_ms / 1000.0
            ),
            count: 1,
            first_occurrence: now,
            last_occurrence: now,
            context: HealthAlertContext {
                threshold: config.critical_latency_ms,
                actual: latency.average_latency_ms,
                p95_latency_ms: Some(latency.p95_latency_ms),
                p99_latency_ms: Some(latency.p99_latency_ms),
                ..Default::default()
            },
        });
    } else if latency.average_latency_ms > config.max_healthy_latency_ms {
        alerts.push(HealthAlert {
            level: HealthLevel::Warning,
            kind: HealthAlertKind::HighLatency,
            message: format!(
                "Average latency is above healthy threshold at {:.1}s",
                latency.average_latency_ms / 1000.0
            ),
            count: 1,
            first_occurrence: now,
            last_occurrence: now,
            context: HealthAlertContext {
                threshold: config.max_healthy_latency_ms,
                actual: latency.average_latency_ms,
                ..Default::default()
            },
        });
    }

    alerts
}

/// Highest level among `alerts`, or `HEALTHY` when there are none.
pub fn determine_health_level(alerts: &[HealthAlert]) -> HealthLevel {
    alerts
        .iter()
        .map(|a| a.level)
        .max()
        .unwrap_or(HealthLevel::Healthy)
}
