use serde::{Deserialize, Serialize};

/// Thresholds driving timing classification and status derivation.
///
/// Every field has a default, so a partial `[metrics]` table in the
/// tracker configuration only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Latency above this is counted as delayed.
    #[serde(default = "default_delay_threshold_ms")]
    pub delay_threshold_ms: f64,
    /// Latency above this is counted as severely delayed.
    #[serde(default = "default_severe_delay_threshold_ms")]
    pub severe_delay_threshold_ms: f64,
    #[serde(default = "default_healthy_success_rate")]
    pub healthy_success_rate_threshold: f64,
    #[serde(default = "default_critical_success_rate")]
    pub critical_success_rate_threshold: f64,
    #[serde(default = "default_max_healthy_latency_ms")]
    pub max_healthy_latency_ms: f64,
    #[serde(default = "default_critical_latency_ms")]
    pub critical_latency_ms: f64,
    #[serde(default = "default_max_healthy_failure_rate")]
    pub max_healthy_failure_rate_threshold: f64,
    #[serde(default = "default_critical_failure_rate")]
    pub critical_failure_rate_threshold: f64,
    /// Trailing failures (or an all-failure window shorter than this)
    /// that mark the system as down.
    #[serde(default = "default_consecutive_failure_threshold")]
    pub consecutive_failure_threshold: usize,
    /// Maximum observations retained and aggregated.
    #[serde(default = "default_max_window_entries")]
    pub max_window_entries: usize,
}

fn default_delay_threshold_ms() -> f64 {
    60_000.0
}

fn default_severe_delay_threshold_ms() -> f64 {
    300_000.0
}

fn default_healthy_success_rate() -> f64 {
    95.0
}

fn default_critical_success_rate() -> f64 {
    80.0
}

fn default_max_healthy_latency_ms() -> f64 {
    30_000.0
}

fn default_critical_latency_ms() -> f64 {
    120_000.0
}

fn default_max_healthy_failure_rate() -> f64 {
    5.0
}

fn default_critical_failure_rate() -> f64 {
    20.0
}

fn default_consecutive_failure_threshold() -> usize {
    5
}

fn default_max_window_entries() -> usize {
    100
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            delay_threshold_ms: default_delay_threshold_ms(),
            severe_delay_threshold_ms: default_severe_delay_threshold_ms(),
            healthy_success_rate_threshold: default_healthy_success_rate(),
            critical_success_rate_threshold: default_critical_success_rate(),
            max_healthy_latency_ms: default_max_healthy_latency_ms(),
            critical_latency_ms: default_critical_latency_ms(),
            max_healthy_failure_rate_threshold: default_max_healthy_failure_rate(),
            critical_failure_rate_threshold: default_critical_failure_rate(),
            consecutive_failure_threshold: default_consecutive_failure_threshold(),
            max_window_entries: default_max_window_entries(),
        }
    }
}
