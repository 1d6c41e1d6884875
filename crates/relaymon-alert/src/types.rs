use crate::rule::{AlertCategory, AlertRule, AlertSeverity, NotificationChannelKind};
use chrono::{DateTime, Utc};
use relaymon_common::types::Observation;
use relaymon_metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default look-back window reported in alert messages.
pub const DEFAULT_TIME_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Everything a rule is evaluated against in one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertContext {
    pub snapshot: MetricsSnapshot,
    pub observations: Vec<Observation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<MetricsSnapshot>,
    pub time_window_ms: u64,
}

impl AlertContext {
    pub fn new(snapshot: MetricsSnapshot, observations: Vec<Observation>) -> Self {
        Self {
            snapshot,
            observations,
            previous: None,
            time_window_ms: DEFAULT_TIME_WINDOW_MS,
        }
    }

    pub fn with_previous(mut self, previous: Option<MetricsSnapshot>) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_time_window_ms(mut self, time_window_ms: u64) -> Self {
        self.time_window_ms = time_window_ms;
        self
    }
}

/// A fired alert. Created once per trigger and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    pub metadata: Map<String, Value>,
    pub resolved: bool,
}

/// Outcome for one rule in one cycle. Produced for every rule, fired or
/// not.
#[derive(Debug, Clone)]
pub struct AlertEvaluationResult<'a> {
    pub rule: &'a AlertRule,
    pub triggered: bool,
    pub alert: Option<Alert>,
    pub reason: Option<&'static str>,
}

impl<'a> AlertEvaluationResult<'a> {
    pub(crate) fn skipped(rule: &'a AlertRule, reason: &'static str) -> Self {
        Self {
            rule,
            triggered: false,
            alert: None,
            reason: Some(reason),
        }
    }

    pub(crate) fn fired(rule: &'a AlertRule, alert: Alert) -> Self {
        Self {
            rule,
            triggered: true,
            alert: Some(alert),
            reason: None,
        }
    }
}

/// Payload handed to the notification layer for a fired alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertNotification {
    pub alert: Alert,
    pub rule: AlertRule,
    pub context: AlertContext,
    /// Explicit targets. Empty means every registered channel.
    pub channels: Vec<NotificationChannelKind>,
}

impl AlertNotification {
    pub fn new(alert: Alert, rule: &AlertRule, context: &AlertContext) -> Self {
        Self {
            alert,
            channels: rule.channels.clone(),
            rule: rule.clone(),
            context: context.clone(),
        }
    }
}
