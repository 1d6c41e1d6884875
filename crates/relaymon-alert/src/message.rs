use crate::field::{FieldValue, ListItem, MetricField, Unit};
use crate::rule::AlertRule;
use crate::types::{Alert, AlertContext};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Renders a number with its unit.
///
/// # Examples
///
/// ```
/// use relaymon_alert::field::Unit;
/// use relaymon_alert::message::format_value;
///
/// assert_eq!(format_value(450.0, Unit::Millis), "450 ms");
/// assert_eq!(format_value(2_500.0, Unit::Millis), "2.5 seconds");
/// assert_eq!(format_value(150_000.0, Unit::Millis), "2.5 minutes");
/// assert_eq!(format_value(1_250_000.0, Unit::Gas), "1.25M gas");
/// ```
pub fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Millis if value >= 60_000.0 => format!("{:.1} minutes", value / 60_000.0),
        Unit::Millis if value >= 1_000.0 => format!("{:.1} seconds", value / 1_000.0),
        Unit::Millis => format!("{value} ms"),
        Unit::Percent => format!("{value:.1}%"),
        Unit::Gas if value >= 1_000_000.0 => format!("{:.2}M gas", value / 1_000_000.0),
        Unit::Gas if value >= 1_000.0 => format!("{:.1}K gas", value / 1_000.0),
        Unit::Gas => format!("{value} gas"),
        Unit::Messages => format!("{value} messages"),
        Unit::Plain => format!("{value}"),
    }
}

fn format_list(items: &[ListItem]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }

    if items.iter().any(|i| i.level.is_some()) {
        return items
            .iter()
            .map(|item| match (&item.level, item.count) {
                (Some(level), Some(count)) if count > 0 => {
                    format!("{level}: {} ({count})", item.kind)
                }
                (Some(level), _) => format!("{level}: {}", item.kind),
                (None, _) => item.kind.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
    }

    if items.len() <= 3 {
        items
            .iter()
            .map(|i| i.kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        format!("{} items: {}, {}, ...", items.len(), items[0].kind, items[1].kind)
    }
}

fn format_field(field: MetricField, value: &FieldValue) -> String {
    match value {
        FieldValue::Number(n) => format_value(*n, field.unit()),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => format_list(items),
    }
}

/// Rule description followed by the current value of every condition
/// field and the data window length.
pub fn generate_alert_message(rule: &AlertRule, ctx: &AlertContext) -> String {
    let mut message = rule.description.clone();

    for condition in &rule.conditions {
        if let Some(value) = condition.field.resolve(&ctx.snapshot) {
            message.push_str(&format!(
                " Current {}: {}.",
                condition.field.leaf(),
                format_field(condition.field, &value)
            ));
        }
    }

    let window_minutes = ctx.time_window_ms as f64 / 60_000.0;
    message.push_str(&format!(" Data window: {window_minutes} minutes."));
    message
}

/// Values of the rule's condition fields plus the basic status block, keyed
/// by field path.
pub fn extract_relevant_metrics(rule: &AlertRule, ctx: &AlertContext) -> Map<String, Value> {
    let mut relevant = Map::new();
    for condition in &rule.conditions {
        if let Some(value) = condition.field.resolve(&ctx.snapshot) {
            relevant.insert(condition.field.path().to_string(), value.to_json());
        }
    }

    let status = &ctx.snapshot.status;
    relevant.insert(
        "operational_status".to_string(),
        Value::from(status.operational_status.as_str()),
    );
    relevant.insert(
        "health_level".to_string(),
        Value::from(status.health_level.as_str()),
    );
    relevant.insert(
        "last_update".to_string(),
        Value::from(status.last_update.to_rfc3339()),
    );
    relevant
}

pub fn create_alert(rule: &AlertRule, ctx: &AlertContext, now: DateTime<Utc>) -> Alert {
    let mut metadata = Map::new();
    metadata.insert("rule_id".to_string(), Value::from(rule.id.clone()));
    metadata.insert("rule_name".to_string(), Value::from(rule.name.clone()));
    metadata.insert(
        "conditions".to_string(),
        serde_json::to_value(&rule.conditions).unwrap_or(Value::Null),
    );
    metadata.insert(
        "metrics_snapshot".to_string(),
        Value::Object(extract_relevant_metrics(rule, ctx)),
    );
    for (key, value) in &rule.metadata {
        metadata.insert(key.clone(), value.clone());
    }

    Alert {
        id: format!("{}_{}", rule.id, relaymon_common::id::next_id()),
        timestamp: now,
        severity: rule.severity,
        category: rule.category,
        title: rule.name.clone(),
        message: generate_alert_message(rule, ctx),
        metadata,
        resolved: false,
    }
}
