use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::NotificationChannel;
use async_trait::async_trait;
use relaymon_alert::{AlertNotification, AlertSeverity, NotificationChannelKind};
use serde_json::Value;
use std::sync::Arc;

/// Writes notifications to the tracing log. Useful as a stand-in target
/// when no external service is configured.
pub struct LogChannel {
    instance_id: String,
}

impl LogChannel {
    pub fn new(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
        }
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, notification: &AlertNotification) -> anyhow::Result<()> {
        let alert = &notification.alert;
        match alert.severity {
            AlertSeverity::Critical | AlertSeverity::High => tracing::warn!(
                instance = %self.instance_id,
                alert_id = %alert.id,
                severity = %alert.severity,
                category = %alert.category,
                title = %alert.title,
                "ALERT TRIGGERED: {}",
                alert.message
            ),
            AlertSeverity::Medium | AlertSeverity::Low => tracing::info!(
                instance = %self.instance_id,
                alert_id = %alert.id,
                severity = %alert.severity,
                category = %alert.category,
                title = %alert.title,
                "ALERT TRIGGERED: {}",
                alert.message
            ),
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

// Plugin

pub struct LogPlugin;

impl ChannelPlugin for LogPlugin {
    fn name(&self) -> &str {
        "log"
    }

    fn default_target(&self) -> Option<NotificationChannelKind> {
        None
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        match config {
            Value::Null => Ok(()),
            Value::Object(map) if map.is_empty() => Ok(()),
            _ => Err(NotifyError::InvalidConfig(
                "log channel takes no options".to_string(),
            )),
        }
    }

    fn create_channel(&self, instance_id: &str, _config: &Value) -> Result<Arc<dyn NotificationChannel>> {
        Ok(Arc::new(LogChannel::new(instance_id)))
    }
}
