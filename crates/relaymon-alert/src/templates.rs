//! Built-in rule templates and the default rule set derived from them.

use crate::condition::{AlertCondition, ConditionValue, Operator};
use crate::field::MetricField;
use crate::rule::{AlertCategory, AlertRule, AlertSeverity};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateValue {
    Number(f64),
    Text(&'static str),
}

impl From<TemplateValue> for ConditionValue {
    fn from(v: TemplateValue) -> Self {
        match v {
            TemplateValue::Number(n) => ConditionValue::Number(n),
            TemplateValue::Text(s) => ConditionValue::Text(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateCondition {
    pub field: MetricField,
    pub operator: Operator,
    pub duration_ms: Option<u64>,
}

/// A rule shape with a default comparison value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRuleTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub conditions: &'static [TemplateCondition],
    pub default_value: TemplateValue,
}

const fn cond(field: MetricField, operator: Operator, duration_ms: Option<u64>) -> TemplateCondition {
    TemplateCondition {
        field,
        operator,
        duration_ms,
    }
}

const SECOND: u64 = 1000;
const MINUTE: u64 = 60 * SECOND;

pub static ALERT_RULE_TEMPLATES: [AlertRuleTemplate; 10] = [
    AlertRuleTemplate {
        name: "High Latency Alert",
        description: "Triggers when average latency exceeds threshold",
        category: AlertCategory::Latency,
        severity: AlertSeverity::High,
        conditions: &[cond(MetricField::AverageLatency, Operator::Gt, Some(MINUTE))],
        default_value: TemplateValue::Number(30_000.0),
    },
    AlertRuleTemplate {
        name: "Critical Latency Alert",
        description: "Triggers when average latency is critically high",
        category: AlertCategory::Latency,
        severity: AlertSeverity::Critical,
        conditions: &[cond(MetricField::AverageLatency, Operator::Gt, Some(30 * SECOND))],
        default_value: TemplateValue::Number(120_000.0),
    },
    AlertRuleTemplate {
        name: "Low Success Rate Alert",
        description: "Triggers when success rate drops below threshold",
        category: AlertCategory::Throughput,
        severity: AlertSeverity::High,
        conditions: &[cond(MetricField::SuccessRate, Operator::Lt, Some(2 * MINUTE))],
        default_value: TemplateValue::Number(95.0),
    },
    AlertRuleTemplate {
        name: "Critical Success Rate Alert",
        description: "Triggers when success rate is critically low",
        category: AlertCategory::Throughput,
        severity: AlertSeverity::Critical,
        conditions: &[cond(MetricField::SuccessRate, Operator::Lt, Some(MINUTE))],
        default_value: TemplateValue::Number(80.0),
    },
    AlertRuleTemplate {
        name: "High Error Rate Alert",
        description: "Triggers when error rate exceeds threshold",
        category: AlertCategory::ErrorRate,
        severity: AlertSeverity::Medium,
        conditions: &[cond(MetricField::ErrorRate, Operator::Gt, Some(3 * MINUTE))],
        default_value: TemplateValue::Number(5.0),
    },
    AlertRuleTemplate {
        name: "System Down Alert",
        description: "Triggers when operational status is DOWN",
        category: AlertCategory::SystemStatus,
        severity: AlertSeverity::Critical,
        conditions: &[cond(MetricField::OperationalStatus, Operator::Eq, None)],
        default_value: TemplateValue::Text("DOWN"),
    },
    AlertRuleTemplate {
        name: "System Degraded Alert",
        description: "Triggers when operational status is DEGRADED",
        category: AlertCategory::SystemStatus,
        severity: AlertSeverity::High,
        conditions: &[cond(MetricField::OperationalStatus, Operator::Eq, Some(5 * MINUTE))],
        default_value: TemplateValue::Text("DEGRADED"),
    },
    AlertRuleTemplate {
        name: "Consecutive Failures Alert",
        description: "Triggers when there are consecutive failures",
        category: AlertCategory::ConsecutiveFailures,
        severity: AlertSeverity::Critical,
        conditions: &[cond(MetricField::HealthAlerts, Operator::Contains, None)],
        default_value: TemplateValue::Text("CONSECUTIVE_FAILURES"),
    },
    AlertRuleTemplate {
        name: "High Gas Usage Alert",
        description: "Triggers when average gas usage is unusually high",
        category: AlertCategory::GasUsage,
        severity: AlertSeverity::Medium,
        conditions: &[cond(MetricField::AverageSendGas, Operator::Gt, Some(10 * MINUTE))],
        default_value: TemplateValue::Number(1_000_000.0),
    },
    AlertRuleTemplate {
        name: "Severe Timing Delays Alert",
        description: "Triggers when message timing is severely delayed",
        category: AlertCategory::Timing,
        severity: AlertSeverity::High,
        conditions: &[cond(MetricField::TimingStatus, Operator::Eq, Some(3 * MINUTE))],
        default_value: TemplateValue::Text("SEVERELY_DELAYED"),
    },
];

fn build_conditions(
    template: &AlertRuleTemplate,
    value_for: impl Fn(&TemplateCondition) -> ConditionValue,
) -> Vec<AlertCondition> {
    template
        .conditions
        .iter()
        .map(|c| AlertCondition {
            field: c.field,
            operator: c.operator,
            value: Some(value_for(c)),
            duration_ms: c.duration_ms,
        })
        .collect()
}

/// One rule per template, ids `rule_<category>_<n>` with `n` counted from 1
/// across the whole template list.
pub fn default_rules() -> Vec<AlertRule> {
    ALERT_RULE_TEMPLATES
        .iter()
        .enumerate()
        .map(|(index, template)| {
            let id = format!(
                "rule_{}_{}",
                template.category.as_str().to_lowercase(),
                index + 1
            );
            let mut builder = AlertRule::builder(
                id,
                template.name,
                template.description,
                template.category,
                template.severity,
            )
            .metadata("template", template.name)
            .metadata("auto_generated", true);
            for condition in build_conditions(template, |_| template.default_value.into()) {
                builder = builder.condition(condition);
            }
            builder.build()
        })
        .collect()
}

/// Builds a rule from `template`. Each condition's value is looked up in
/// `overrides` by the field's leaf name, then by the key `"value"`, falling
/// back to the template default.
pub fn create_rule_from_template(
    template: &AlertRuleTemplate,
    id: impl Into<String>,
    overrides: &HashMap<String, ConditionValue>,
) -> AlertRule {
    let conditions = build_conditions(template, |c| {
        overrides
            .get(c.field.leaf())
            .or_else(|| overrides.get("value"))
            .cloned()
            .unwrap_or_else(|| template.default_value.into())
    });

    let custom: serde_json::Map<String, Value> = overrides
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
        .collect();

    let mut builder = AlertRule::builder(
        id,
        template.name,
        template.description,
        template.category,
        template.severity,
    )
    .metadata("template", template.name)
    .metadata("custom_values", Value::Object(custom));
    for condition in conditions {
        builder = builder.condition(condition);
    }
    builder.build()
}

/// Looks a template up by its display name.
pub fn find_template(name: &str) -> Option<&'static AlertRuleTemplate> {
    ALERT_RULE_TEMPLATES.iter().find(|t| t.name == name)
}
