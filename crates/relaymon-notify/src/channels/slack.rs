use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::utils::{truncate_string, MAX_BODY_LENGTH};
use crate::NotificationChannel;
use async_trait::async_trait;
use relaymon_alert::{AlertNotification, AlertSeverity, NotificationChannelKind};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

fn severity_color(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => "danger",
        AlertSeverity::High => "warning",
        AlertSeverity::Medium => "#ff9500",
        AlertSeverity::Low => "good",
    }
}

fn severity_emoji(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => ":rotating_light:",
        AlertSeverity::High => ":warning:",
        AlertSeverity::Medium => ":large_orange_diamond:",
        AlertSeverity::Low => ":information_source:",
    }
}

/// Slack mrkdwn body for an alert.
pub(crate) fn format_alert_text(notification: &AlertNotification) -> String {
    let alert = &notification.alert;
    let mut text = String::new();
    let _ = writeln!(text, "*{}*", alert.title);
    let _ = writeln!(text, "*Severity:* {}", alert.severity);
    let _ = writeln!(text, "*Category:* {}", alert.category);
    let _ = writeln!(text, "*Time:* {}", alert.timestamp.to_rfc3339());
    let _ = writeln!(text, "*Message:* {}", alert.message);

    if let Some(Value::Object(metrics)) = alert.metadata.get("metrics_snapshot") {
        let _ = writeln!(text, "\n*Current Metrics:*");
        for key in ["operational_status", "health_level"] {
            if let Some(Value::String(v)) = metrics.get(key) {
                let _ = writeln!(text, "• {key}: {v}");
            }
        }
        for (key, value) in metrics {
            if matches!(key.as_str(), "operational_status" | "health_level" | "last_update") {
                continue;
            }
            match value {
                Value::String(s) => {
                    let _ = writeln!(text, "• {key}: {s}");
                }
                other => {
                    let _ = writeln!(text, "• {key}: {other}");
                }
            }
        }
    }

    let minutes = notification.context.time_window_ms as f64 / 60_000.0;
    let _ = write!(text, "\n*Data Window:* {minutes} minutes");
    text
}

pub struct SlackChannel {
    instance_id: String,
    client: reqwest::Client,
    webhook_url: String,
    channel: Option<String>,
    username: String,
    icon_emoji: Option<String>,
}

impl SlackChannel {
    pub(crate) fn build_payload(&self, notification: &AlertNotification) -> Value {
        let severity = notification.alert.severity;
        let icon = self
            .icon_emoji
            .as_deref()
            .unwrap_or_else(|| severity_emoji(severity));
        let mut payload = serde_json::json!({
            "username": self.username,
            "icon_emoji": icon,
            "attachments": [{
                "color": severity_color(severity),
                "text": format_alert_text(notification),
                "ts": notification.alert.timestamp.timestamp(),
            }],
        });
        if let (Some(channel), Some(obj)) = (&self.channel, payload.as_object_mut()) {
            obj.insert("channel".to_string(), Value::from(channel.clone()));
        }
        payload
    }
}

#[async_trait]
impl NotificationChannel for SlackChannel {
    async fn send(&self, notification: &AlertNotification) -> anyhow::Result<()> {
        let payload = self.build_payload(notification);
        let resp = self
            .client
            .post(self.webhook_url.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(NotifyError::from)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                instance = %self.instance_id,
                status = %status,
                "Slack webhook error"
            );
            return Err(NotifyError::ApiError {
                service: "slack".to_string(),
                status: status.as_u16(),
                body: truncate_string(&body, MAX_BODY_LENGTH),
            }
            .into());
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "slack"
    }
}

// Plugin

#[derive(Deserialize)]
struct SlackConfig {
    webhook_url: String,
    channel: Option<String>,
    #[serde(default = "default_username")]
    username: String,
    icon_emoji: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_username() -> String {
    "Relay Monitor".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn parse_config(config: &Value) -> Result<SlackConfig> {
    let cfg: SlackConfig = serde_json::from_value(config.clone())
        .map_err(|e| NotifyError::InvalidConfig(format!("slack: {e}")))?;
    if !cfg.webhook_url.starts_with("https://") {
        return Err(NotifyError::InvalidConfig(
            "slack: webhook_url must be an https URL".to_string(),
        ));
    }
    Ok(cfg)
}

pub struct SlackPlugin;

impl SlackPlugin {
    pub(crate) fn build(instance_id: &str, config: &Value) -> Result<SlackChannel> {
        let cfg = parse_config(config)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(SlackChannel {
            instance_id: instance_id.to_string(),
            client,
            webhook_url: cfg.webhook_url,
            channel: cfg.channel,
            username: cfg.username,
            icon_emoji: cfg.icon_emoji,
        })
    }
}

impl ChannelPlugin for SlackPlugin {
    fn name(&self) -> &str {
        "slack"
    }

    fn default_target(&self) -> Option<NotificationChannelKind> {
        Some(NotificationChannelKind::Slack)
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        parse_config(config).map(|_| ())
    }

    fn create_channel(&self, instance_id: &str, config: &Value) -> Result<Arc<dyn NotificationChannel>> {
        Ok(Arc::new(Self::build(instance_id, config)?))
    }
}
