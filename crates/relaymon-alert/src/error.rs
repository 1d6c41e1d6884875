/// Errors raised while loading or validating alert rules.
///
/// Condition evaluation itself never fails: a missing field or a type
/// mismatch simply evaluates to false.
///
/// # Examples
///
/// ```rust
/// use relaymon_alert::error::AlertError;
///
/// let err = AlertError::UnknownField("status.colour".to_string());
/// assert!(err.to_string().contains("status.colour"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// A rule failed validation. Carries every problem found, not just the
    /// first.
    #[error("Alert: invalid rule '{id}': {}", .errors.join("; "))]
    InvalidRule { id: String, errors: Vec<String> },

    /// A condition references a path that is not part of the metrics
    /// snapshot.
    #[error("Alert: unknown metric field '{0}'")]
    UnknownField(String),

    #[error("Alert: unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Alert: failed to read rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Alert: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for rule operations.
pub type Result<T> = std::result::Result<T, AlertError>;
