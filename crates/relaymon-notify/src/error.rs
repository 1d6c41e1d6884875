/// Errors that can occur within the notification subsystem.
///
/// [`crate::NotificationChannel::send`] returns `anyhow::Result` so that
/// caller-supplied callbacks can fail with any error; the built-in channels
/// and the plugin registry use this type.
///
/// # Examples
///
/// ```rust
/// use relaymon_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("missing webhook_url".to_string());
/// assert!(err.to_string().contains("webhook_url"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or contains an invalid value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// The channel plugin is not registered.
    #[error("Notify: unknown channel type '{0}'")]
    UnknownChannelType(String),

    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Notify: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The external API returned a non-success response.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    ApiError {
        service: String,
        status: u16,
        body: String,
    },
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
