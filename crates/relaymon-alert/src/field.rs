//! Typed accessor table for the metrics snapshot.
//!
//! Rule conditions name a snapshot value by its dotted path
//! (`core_metrics.latency.average_latency_ms`). Paths are parsed into a
//! [`MetricField`] when a rule is deserialized, so an unknown path is
//! rejected at load time rather than silently evaluating to false on every
//! cycle.

use crate::error::AlertError;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use relaymon_metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Display unit attached to a numeric field, used when rendering alert
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Millis,
    Percent,
    Gas,
    Messages,
    Plain,
}

/// One entry of a list-valued field. `kind` is the discriminator matched by
/// the `contains` operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub kind: String,
    pub level: Option<String>,
    pub count: Option<u64>,
}

/// A value read out of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    List(Vec<ListItem>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| {
                        serde_json::json!({
                            "kind": item.kind,
                            "level": item.level,
                            "count": item.count,
                        })
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricField {
    OperationalStatus,
    TimingStatus,
    HealthLevel,
    LastUpdate,
    WindowStart,
    WindowEnd,
    AverageLatency,
    MedianLatency,
    MinLatency,
    MaxLatency,
    P95Latency,
    P99Latency,
    AverageSendGas,
    AverageRelayGas,
    TotalGasUsed,
    MinSendGas,
    MaxSendGas,
    MinRelayGas,
    MaxRelayGas,
    TotalMessages,
    SuccessfulMessages,
    FailedMessages,
    SuccessRate,
    MessagesPerHour,
    OnTimeMessages,
    DelayedMessages,
    SeverelyDelayedMessages,
    AverageDelay,
    TimingMetricsStatus,
    HealthAlerts,
    SendErrors,
    RelayErrors,
    TotalErrors,
    ErrorRate,
    Recommendations,
}

impl MetricField {
    pub const ALL: [MetricField; 35] = [
        Self::OperationalStatus,
        Self::TimingStatus,
        Self::HealthLevel,
        Self::LastUpdate,
        Self::WindowStart,
        Self::WindowEnd,
        Self::AverageLatency,
        Self::MedianLatency,
        Self::MinLatency,
        Self::MaxLatency,
        Self::P95Latency,
        Self::P99Latency,
        Self::AverageSendGas,
        Self::AverageRelayGas,
        Self::TotalGasUsed,
        Self::MinSendGas,
        Self::MaxSendGas,
        Self::MinRelayGas,
        Self::MaxRelayGas,
        Self::TotalMessages,
        Self::SuccessfulMessages,
        Self::FailedMessages,
        Self::SuccessRate,
        Self::MessagesPerHour,
        Self::OnTimeMessages,
        Self::DelayedMessages,
        Self::SeverelyDelayedMessages,
        Self::AverageDelay,
        Self::TimingMetricsStatus,
        Self::HealthAlerts,
        Self::SendErrors,
        Self::RelayErrors,
        Self::TotalErrors,
        Self::ErrorRate,
        Self::Recommendations,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::OperationalStatus => "status.operational_status",
            Self::TimingStatus => "status.timing_status",
            Self::HealthLevel => "status.health_level",
            Self::LastUpdate => "status.last_update",
            Self::WindowStart => "status.window_start",
            Self::WindowEnd => "status.window_end",
            Self::AverageLatency => "core_metrics.latency.average_latency_ms",
            Self::MedianLatency => "core_metrics.latency.median_latency_ms",
            Self::MinLatency => "core_metrics.latency.min_latency_ms",
            Self::MaxLatency => "core_metrics.latency.max_latency_ms",
            Self::P95Latency => "core_metrics.latency.p95_latency_ms",
            Self::P99Latency => "core_metrics.latency.p99_latency_ms",
            Self::AverageSendGas => "core_metrics.gas.average_send_gas",
            Self::AverageRelayGas => "core_metrics.gas.average_relay_gas",
            Self::TotalGasUsed => "core_metrics.gas.total_gas_used",
            Self::MinSendGas => "core_metrics.gas.min_send_gas",
            Self::MaxSendGas => "core_metrics.gas.max_send_gas",
            Self::MinRelayGas => "core_metrics.gas.min_relay_gas",
            Self::MaxRelayGas => "core_metrics.gas.max_relay_gas",
            Self::TotalMessages => "core_metrics.throughput.total_messages",
            Self::SuccessfulMessages => "core_metrics.throughput.successful_messages",
            Self::FailedMessages => "core_metrics.throughput.failed_messages",
            Self::SuccessRate => "core_metrics.throughput.success_rate",
            Self::MessagesPerHour => "core_metrics.throughput.messages_per_hour",
            Self::OnTimeMessages => "core_metrics.timing.on_time_messages",
            Self::DelayedMessages => "core_metrics.timing.delayed_messages",
            Self::SeverelyDelayedMessages => "core_metrics.timing.severely_delayed_messages",
            Self::AverageDelay => "core_metrics.timing.average_delay_ms",
            Self::TimingMetricsStatus => "core_metrics.timing.timing_status",
            Self::HealthAlerts => "health.alerts",
            Self::SendErrors => "health.error_summary.send_errors",
            Self::RelayErrors => "health.error_summary.relay_errors",
            Self::TotalErrors => "health.error_summary.total_errors",
            Self::ErrorRate => "health.error_summary.error_rate",
            Self::Recommendations => "health.recommendations",
        }
    }

    /// Last path segment, used as the label in alert messages.
    pub fn leaf(&self) -> &'static str {
        let path = self.path();
        path.rsplit('.').next().unwrap_or(path)
    }

    pub fn unit(&self) -> Unit {
        match self {
            Self::AverageLatency
            | Self::MedianLatency
            | Self::MinLatency
            | Self::MaxLatency
            | Self::P95Latency
            | Self::P99Latency
            | Self::AverageDelay => Unit::Millis,
            Self::SuccessRate | Self::ErrorRate => Unit::Percent,
            Self::AverageSendGas
            | Self::AverageRelayGas
            | Self::TotalGasUsed
            | Self::MinSendGas
            | Self::MaxSendGas
            | Self::MinRelayGas
            | Self::MaxRelayGas => Unit::Gas,
            Self::TotalMessages
            | Self::SuccessfulMessages
            | Self::FailedMessages
            | Self::OnTimeMessages
            | Self::DelayedMessages
            | Self::SeverelyDelayedMessages => Unit::Messages,
            _ => Unit::Plain,
        }
    }

    /// Reads this field out of `snapshot`. Every field in the table is
    /// always present, so this only returns `None` for values that cannot
    /// be represented (a non-finite number).
    pub fn resolve(&self, snapshot: &MetricsSnapshot) -> Option<FieldValue> {
        let status = &snapshot.status;
        let latency = &snapshot.core_metrics.latency;
        let gas = &snapshot.core_metrics.gas;
        let throughput = &snapshot.core_metrics.throughput;
        let timing = &snapshot.core_metrics.timing;
        let health = &snapshot.health;

        let value = match self {
            Self::OperationalStatus => text(status.operational_status.as_str()),
            Self::TimingStatus => text(status.timing_status.as_str()),
            Self::HealthLevel => text(status.health_level.as_str()),
            Self::LastUpdate => FieldValue::Text(status.last_update.to_rfc3339()),
            Self::WindowStart => FieldValue::Text(status.window_start.to_rfc3339()),
            Self::WindowEnd => FieldValue::Text(status.window_end.to_rfc3339()),
            Self::AverageLatency => FieldValue::Number(latency.average_latency_ms),
            Self::MedianLatency => FieldValue::Number(latency.median_latency_ms),
            Self::MinLatency => FieldValue::Number(latency.min_latency_ms),
            Self::MaxLatency => FieldValue::Number(latency.max_latency_ms),
            Self::P95Latency => FieldValue::Number(latency.p95_latency_ms),
            Self::P99Latency => FieldValue::Number(latency.p99_latency_ms),
            Self::AverageSendGas => gas_value(&gas.average_send_gas),
            Self::AverageRelayGas => gas_value(&gas.average_relay_gas),
            Self::TotalGasUsed => gas_value(&gas.total_gas_used),
            Self::MinSendGas => gas_value(&gas.min_send_gas),
            Self::MaxSendGas => gas_value(&gas.max_send_gas),
            Self::MinRelayGas => gas_value(&gas.min_relay_gas),
            Self::MaxRelayGas => gas_value(&gas.max_relay_gas),
            Self::TotalMessages => FieldValue::Number(throughput.total_messages as f64),
            Self::SuccessfulMessages => FieldValue::Number(throughput.successful_messages as f64),
            Self::FailedMessages => FieldValue::Number(throughput.failed_messages as f64),
            Self::SuccessRate => FieldValue::Number(throughput.success_rate),
            Self::MessagesPerHour => FieldValue::Number(throughput.messages_per_hour),
            Self::OnTimeMessages => FieldValue::Number(timing.on_time_messages as f64),
            Self::DelayedMessages => FieldValue::Number(timing.delayed_messages as f64),
            Self::SeverelyDelayedMessages => {
                FieldValue::Number(timing.severely_delayed_messages as f64)
            }
            Self::AverageDelay => FieldValue::Number(timing.average_delay_ms),
            Self::TimingMetricsStatus => text(timing.timing_status.as_str()),
            Self::HealthAlerts => FieldValue::List(
                health
                    .alerts
                    .iter()
                    .map(|a| ListItem {
                        kind: a.kind.as_str().to_string(),
                        level: Some(a.level.as_str().to_string()),
                        count: Some(a.count),
                    })
                    .collect(),
            ),
            Self::SendErrors => tallies(
                health
                    .error_summary
                    .send_errors
                    .iter()
                    .map(|(kind, n)| (kind.as_str(), *n)),
            ),
            Self::RelayErrors => tallies(
                health
                    .error_summary
                    .relay_errors
                    .iter()
                    .map(|(kind, n)| (kind.as_str(), *n)),
            ),
            Self::TotalErrors => FieldValue::Number(health.error_summary.total_errors as f64),
            Self::ErrorRate => FieldValue::Number(health.error_summary.error_rate),
            Self::Recommendations => FieldValue::List(
                health
                    .recommendations
                    .iter()
                    .map(|r| ListItem {
                        kind: r.clone(),
                        level: None,
                        count: None,
                    })
                    .collect(),
            ),
        };

        match value {
            FieldValue::Number(n) if !n.is_finite() => None,
            v => Some(v),
        }
    }
}

fn text(s: &str) -> FieldValue {
    FieldValue::Text(s.to_string())
}

/// Per-kind error counts as a list; `contains` matches on the kind.
fn tallies<'a>(counts: impl Iterator<Item = (&'a str, u64)>) -> FieldValue {
    FieldValue::List(
        counts
            .map(|(kind, count)| ListItem {
                kind: kind.to_string(),
                level: None,
                count: Some(count),
            })
            .collect(),
    )
}

fn gas_value(gas: &BigUint) -> FieldValue {
    FieldValue::Number(gas.to_f64().unwrap_or(f64::INFINITY))
}

/// `averageLatencyMs` -> `average_latency_ms`, applied per path segment.
fn to_snake_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 8);
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('.') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

impl FromStr for MetricField {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = to_snake_case(s.trim());
        // legacy names for the status block
        let normalized = match normalized.as_str() {
            "status.interop_status" => "status.operational_status",
            "status.last_update_timestamp" => "status.last_update",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.path() == normalized)
            .ok_or_else(|| AlertError::UnknownField(s.to_string()))
    }
}

impl TryFrom<String> for MetricField {
    type Error = AlertError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetricField> for String {
    fn from(field: MetricField) -> Self {
        field.path().to_string()
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
