use crate::condition::{ConditionValue, Operator};
use crate::error::{AlertError, Result};
use crate::rule::AlertRule;
use std::collections::HashSet;
use std::path::Path;

/// Checks a rule for structural problems and returns every one found.
/// An empty list means the rule is valid.
///
/// Unknown fields, operators, categories and channels cannot get this far:
/// they are rejected when the rule is deserialized.
pub fn validate_alert_rule(rule: &AlertRule) -> Vec<String> {
    let mut errors = Vec::new();

    if rule.id.trim().is_empty() {
        errors.push("Rule ID is required".to_string());
    }
    if rule.name.trim().is_empty() {
        errors.push("Rule name is required".to_string());
    }
    if rule.description.trim().is_empty() {
        errors.push("Rule description is required".to_string());
    }
    if rule.conditions.is_empty() {
        errors.push("At least one condition is required".to_string());
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        let n = index + 1;
        match (&condition.value, condition.operator) {
            (None, _) => errors.push(format!("Condition {n}: value is required")),
            (Some(ConditionValue::List(_)), Operator::In) => {}
            (Some(_), Operator::In) => {
                errors.push(format!("Condition {n}: operator 'in' requires a list value"))
            }
            (Some(ConditionValue::Number(_)), _) => {}
            (Some(_), Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte) => {
                errors.push(format!(
                    "Condition {n}: operator '{}' requires a numeric value",
                    condition.operator
                ))
            }
            _ => {}
        }
    }

    if rule.channels.is_empty() {
        errors.push("At least one notification channel is required".to_string());
    }

    errors
}

impl AlertRule {
    /// Validates the rule, failing with every problem found.
    pub fn validate(&self) -> Result<()> {
        let errors = validate_alert_rule(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AlertError::InvalidRule {
                id: self.id.clone(),
                errors,
            })
        }
    }
}

/// Parses a JSON array of rules and validates each one. Duplicate ids are
/// rejected since cooldown and duration state are keyed by id.
pub fn parse_rules(json: &str) -> Result<Vec<AlertRule>> {
    let rules: Vec<AlertRule> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    for rule in &rules {
        rule.validate()?;
        if !seen.insert(rule.id.as_str()) {
            return Err(AlertError::InvalidRule {
                id: rule.id.clone(),
                errors: vec!["Duplicate rule ID".to_string()],
            });
        }
    }
    Ok(rules)
}

/// Reads and validates a JSON rule file.
pub fn load_rules(path: impl AsRef<Path>) -> Result<Vec<AlertRule>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let rules = parse_rules(&content)?;
    tracing::info!(
        path = %path.as_ref().display(),
        count = rules.len(),
        "Loaded alert rules"
    );
    Ok(rules)
}
