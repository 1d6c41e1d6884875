use crate::error::AlertError;
use crate::field::{FieldValue, MetricField};
use relaymon_metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Comparison applied by a condition. Rule files may use the short names
/// (`gt`) or the long aliases (`greater_than`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    Contains,
    In,
}

impl FromStr for Operator {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" | "greater_than" => Ok(Self::Gt),
            "gte" | "greater_equal" => Ok(Self::Gte),
            "lt" | "less_than" => Ok(Self::Lt),
            "lte" | "less_equal" => Ok(Self::Lte),
            "eq" | "equal" => Ok(Self::Eq),
            "neq" | "not_equal" => Ok(Self::Neq),
            "contains" => Ok(Self::Contains),
            "in" => Ok(Self::In),
            _ => Err(AlertError::UnknownOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = AlertError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Contains => "contains",
            Self::In => "in",
        };
        f.write_str(s)
    }
}

/// Right-hand side of a condition as written in a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ConditionValue>),
}

impl From<f64> for ConditionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ConditionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for ConditionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Scalar equality. Values of different types are never equal, and lists
/// never compare equal to anything.
fn scalar_eq(actual: &FieldValue, expected: &ConditionValue) -> Option<bool> {
    match (actual, expected) {
        (FieldValue::Number(a), ConditionValue::Number(b)) => Some(a == b),
        (FieldValue::Text(a), ConditionValue::Text(b)) => Some(a == b),
        _ => None,
    }
}

impl Operator {
    /// Applies the operator. A type mismatch between the two sides is
    /// always `false`, for `neq` as well.
    pub fn matches(&self, actual: &FieldValue, expected: &ConditionValue) -> bool {
        let ordered = |check: fn(f64, f64) -> bool| match (actual.as_number(), expected) {
            (Some(a), ConditionValue::Number(b)) => check(a, *b),
            _ => false,
        };

        match self {
            Self::Gt => ordered(|a, b| a > b),
            Self::Gte => ordered(|a, b| a >= b),
            Self::Lt => ordered(|a, b| a < b),
            Self::Lte => ordered(|a, b| a <= b),
            Self::Eq => scalar_eq(actual, expected).unwrap_or(false),
            Self::Neq => scalar_eq(actual, expected).is_some_and(|eq| !eq),
            Self::Contains => match (actual, expected) {
                (FieldValue::List(items), ConditionValue::Text(kind)) => {
                    items.iter().any(|item| item.kind == *kind)
                }
                (FieldValue::Text(haystack), ConditionValue::Text(needle)) => {
                    haystack.contains(needle.as_str())
                }
                _ => false,
            },
            Self::In => match expected {
                ConditionValue::List(candidates) => candidates
                    .iter()
                    .any(|c| scalar_eq(actual, c).unwrap_or(false)),
                _ => false,
            },
        }
    }
}

/// One clause of a rule. All clauses of a rule must hold in the same cycle
/// for it to fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    pub field: MetricField,
    pub operator: Operator,
    /// Missing in a hand-written rule file is a validation error; an
    /// unvalidated rule with no value never matches.
    #[serde(default)]
    pub value: Option<ConditionValue>,
    /// How long, in milliseconds, the clause must hold continuously before
    /// it counts as satisfied.
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl AlertCondition {
    pub fn new(field: MetricField, operator: Operator, value: impl Into<ConditionValue>) -> Self {
        Self {
            field,
            operator,
            value: Some(value.into()),
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Evaluates the clause against `snapshot`, ignoring any duration.
    pub fn is_met(&self, snapshot: &MetricsSnapshot) -> bool {
        let Some(expected) = &self.value else {
            return false;
        };
        match self.field.resolve(snapshot) {
            Some(actual) => self.operator.matches(&actual, expected),
            None => false,
        }
    }
}
