use crate::config::MetricsConfig;
use crate::health::{determine_health_level, generate_health_alerts, HealthAlert, HealthLevel};
use crate::recommendations::generate_recommendations;
use crate::stats::{
    calculate_error_summary, calculate_gas_metrics, calculate_latency_metrics,
    calculate_throughput_metrics, calculate_timing_metrics, ErrorSummary, GasMetrics,
    LatencyMetrics, ThroughputMetrics, TimingMetrics, TimingStatus,
};
use crate::status::{determine_operational_status, OperationalStatus};
use chrono::{DateTime, Utc};
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSection {
    pub operational_status: OperationalStatus,
    pub timing_status: TimingStatus,
    pub health_level: HealthLevel,
    pub last_update: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreMetrics {
    pub latency: LatencyMetrics,
    pub gas: GasMetrics,
    pub throughput: ThroughputMetrics,
    pub timing: TimingMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSection {
    pub alerts: Vec<HealthAlert>,
    pub error_summary: ErrorSummary,
    pub recommendations: Vec<String>,
}

/// Immutable bundle of statistics and derived status for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub status: StatusSection,
    pub core_metrics: CoreMetrics,
    pub health: HealthSection,
}

impl MetricsSnapshot {
    /// Snapshot for a window with no observations.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            status: StatusSection {
                operational_status: OperationalStatus::Unknown,
                timing_status: TimingStatus::OnTime,
                health_level: HealthLevel::Healthy,
                last_update: now,
                window_start: now,
                window_end: now,
            },
            core_metrics: CoreMetrics::default(),
            health: HealthSection {
                recommendations: vec!["No data available for analysis".to_string()],
                ..Default::default()
            },
        }
    }
}

/// Computes a snapshot from an arbitrary slice of observations.
///
/// Only the most recent `config.max_window_entries` observations are
/// aggregated, so callers may pass a longer history for offline analysis.
pub fn generate_snapshot(
    observations: &[Observation],
    config: &MetricsConfig,
    now: DateTime<Utc>,
) -> MetricsSnapshot {
    if observations.is_empty() {
        return MetricsSnapshot::empty(now);
    }

    let start = observations.len().saturating_sub(config.max_window_entries);
    let window = &observations[start..];

    let latency = calculate_latency_metrics(window);
    let gas = calculate_gas_metrics(window);
    let throughput = calculate_throughput_metrics(window);
    let timing = calculate_timing_metrics(window, config);
    let error_summary = calculate_error_summary(window);
    let alerts = generate_health_alerts(window, &latency, &throughput, config, now);

    let operational_status = determine_operational_status(&throughput, &latency, config, window);
    let health_level = determine_health_level(&alerts);
    let recommendations = generate_recommendations(operational_status, &alerts, &throughput, &latency);

    let window_start = window.iter().map(|o| o.timestamp).min().unwrap_or(now);
    let window_end = window.iter().map(|o| o.timestamp).max().unwrap_or(now);

    tracing::debug!(
        observations = window.len(),
        status = %operational_status,
        health = %health_level,
        alerts = alerts.len(),
        "Metrics snapshot generated"
    );

    MetricsSnapshot {
        status: StatusSection {
            operational_status,
            timing_status: timing.timing_status,
            health_level,
            last_update: now,
            window_start,
            window_end,
        },
        core_metrics: CoreMetrics {
            latency,
            gas,
            throughput,
            timing,
        },
        health: HealthSection {
            alerts,
            error_summary,
            recommendations,
        },
    }
}
