use crate::condition::AlertCondition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Channels a rule of this severity notifies when none are given.
    pub fn default_channels(&self) -> Vec<NotificationChannelKind> {
        use NotificationChannelKind::*;
        match self {
            Self::Critical => vec![Email, Slack, Sms],
            Self::High => vec![Email, Slack],
            Self::Medium | Self::Low => vec![Slack],
        }
    }

    /// Cooldown a rule of this severity uses when none is given.
    pub fn default_cooldown_ms(&self) -> u64 {
        const MINUTE: u64 = 60 * 1000;
        match self {
            Self::Critical => 5 * MINUTE,
            Self::High => 15 * MINUTE,
            Self::Medium => 30 * MINUTE,
            Self::Low => 60 * MINUTE,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    Latency,
    Throughput,
    ErrorRate,
    SystemStatus,
    ConsecutiveFailures,
    GasUsage,
    Timing,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latency => "LATENCY",
            Self::Throughput => "THROUGHPUT",
            Self::ErrorRate => "ERROR_RATE",
            Self::SystemStatus => "SYSTEM_STATUS",
            Self::ConsecutiveFailures => "CONSECUTIVE_FAILURES",
            Self::GasUsage => "GAS_USAGE",
            Self::Timing => "TIMING",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical notification target named by a rule. The dispatcher maps each
/// kind to a registered channel implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannelKind {
    Email,
    Slack,
    Webhook,
    Sms,
    Discord,
    Telegram,
}

impl NotificationChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Slack => "SLACK",
            Self::Webhook => "WEBHOOK",
            Self::Sms => "SMS",
            Self::Discord => "DISCORD",
            Self::Telegram => "TELEGRAM",
        }
    }
}

impl std::fmt::Display for NotificationChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EMAIL" => Ok(Self::Email),
            "SLACK" => Ok(Self::Slack),
            "WEBHOOK" => Ok(Self::Webhook),
            "SMS" => Ok(Self::Sms),
            "DISCORD" => Ok(Self::Discord),
            "TELEGRAM" => Ok(Self::Telegram),
            _ => Err(format!("unknown notification channel: {s}")),
        }
    }
}

/// A declarative alert rule. Rules are supplied by the caller and never
/// mutated by the engine.
///
/// When deserialized, omitted `channels` and `cooldown_ms` default from the
/// severity the same way [`AlertRule::builder`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleDefinition")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub enabled: bool,
    pub conditions: Vec<AlertCondition>,
    pub channels: Vec<NotificationChannelKind>,
    pub cooldown_ms: u64,
    pub metadata: Map<String, Value>,
}

/// Wire form of a rule, with the optional fields a rule file may omit.
#[derive(Deserialize)]
struct RuleDefinition {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    category: AlertCategory,
    severity: AlertSeverity,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    conditions: Vec<AlertCondition>,
    #[serde(default)]
    channels: Option<Vec<NotificationChannelKind>>,
    #[serde(default, alias = "cooldown")]
    cooldown_ms: Option<u64>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl From<RuleDefinition> for AlertRule {
    fn from(def: RuleDefinition) -> Self {
        AlertRuleBuilder {
            id: def.id,
            name: def.name,
            description: def.description,
            category: def.category,
            severity: def.severity,
            enabled: def.enabled,
            conditions: def.conditions,
            channels: def.channels,
            cooldown_ms: def.cooldown_ms,
            metadata: def.metadata,
        }
        .build()
    }
}

impl AlertRule {
    /// Starts a rule whose channels and cooldown default from `severity`
    /// unless set on the builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use relaymon_alert::condition::{AlertCondition, Operator};
    /// use relaymon_alert::field::MetricField;
    /// use relaymon_alert::rule::{AlertCategory, AlertRule, AlertSeverity};
    ///
    /// let rule = AlertRule::builder("slow", "Slow relay", "Relay is slow", AlertCategory::Latency, AlertSeverity::High)
    ///     .condition(AlertCondition::new(MetricField::AverageLatency, Operator::Gt, 30_000.0))
    ///     .build();
    /// assert_eq!(rule.cooldown_ms, 15 * 60 * 1000);
    /// assert_eq!(rule.channels.len(), 2);
    /// ```
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: AlertCategory,
        severity: AlertSeverity,
    ) -> AlertRuleBuilder {
        AlertRuleBuilder {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            severity,
            enabled: true,
            conditions: Vec::new(),
            channels: None,
            cooldown_ms: None,
            metadata: Map::new(),
        }
    }
}

pub struct AlertRuleBuilder {
    id: String,
    name: String,
    description: String,
    category: AlertCategory,
    severity: AlertSeverity,
    enabled: bool,
    conditions: Vec<AlertCondition>,
    channels: Option<Vec<NotificationChannelKind>>,
    cooldown_ms: Option<u64>,
    metadata: Map<String, Value>,
}

impl AlertRuleBuilder {
    pub fn condition(mut self, condition: AlertCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn channels(mut self, channels: Vec<NotificationChannelKind>) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> AlertRule {
        AlertRule {
            channels: self
                .channels
                .unwrap_or_else(|| self.severity.default_channels()),
            cooldown_ms: self
                .cooldown_ms
                .unwrap_or_else(|| self.severity.default_cooldown_ms()),
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            severity: self.severity,
            enabled: self.enabled,
            conditions: self.conditions,
            metadata: self.metadata,
        }
    }
}
