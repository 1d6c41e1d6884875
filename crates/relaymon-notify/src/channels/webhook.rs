use crate::error::{NotifyError, Result};
use crate::plugin::ChannelPlugin;
use crate::utils::{json_escape, truncate_string, MAX_BODY_LENGTH};
use crate::NotificationChannel;
use async_trait::async_trait;
use relaymon_alert::{AlertNotification, NotificationChannelKind};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;

pub struct WebhookChannel {
    instance_id: String,
    client: reqwest::Client,
    url: String,
    body_template: Option<String>,
}

impl WebhookChannel {
    pub fn new(instance_id: &str, url: String, body_template: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            instance_id: instance_id.to_string(),
            client,
            url,
            body_template,
        })
    }

    pub(crate) fn render_body(&self, notification: &AlertNotification) -> String {
        let alert = &notification.alert;
        let status = notification.context.snapshot.status.operational_status;
        // templates are JSON, so free-text values are escaped
        if let Some(template) = &self.body_template {
            template
                .replace("{{alert_id}}", &json_escape(&alert.id))
                .replace("{{rule_id}}", &json_escape(&notification.rule.id))
                .replace("{{rule_name}}", &json_escape(&notification.rule.name))
                .replace("{{severity}}", alert.severity.as_str())
                .replace("{{category}}", alert.category.as_str())
                .replace("{{title}}", &json_escape(&alert.title))
                .replace("{{message}}", &json_escape(&alert.message))
                .replace("{{timestamp}}", &alert.timestamp.to_rfc3339())
                .replace("{{status}}", status.as_str())
        } else {
            serde_json::json!({
                "alert_id": alert.id,
                "rule_id": notification.rule.id,
                "rule_name": notification.rule.name,
                "severity": alert.severity,
                "category": alert.category,
                "title": alert.title,
                "message": alert.message,
                "timestamp": alert.timestamp.to_rfc3339(),
                "status": status,
                "metadata": alert.metadata,
            })
            .to_string()
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, notification: &AlertNotification) -> anyhow::Result<()> {
        let body = self.render_body(notification);
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            match self
                .client
                .post(self.url.as_str())
                .header("Content-Type", "application/json")
                .body(body.clone())
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    let resp_body = match resp.text().await {
                        Ok(text) => truncate_string(&text, MAX_BODY_LENGTH),
                        Err(e) => format!("[Failed to read response body: {e}]"),
                    };
                    tracing::warn!(
                        instance = %self.instance_id,
                        attempt = attempt + 1,
                        status = %status,
                        "Webhook returned non-success status, retrying"
                    );
                    last_err = Some(NotifyError::ApiError {
                        service: "webhook".to_string(),
                        status: status.as_u16(),
                        body: resp_body,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        instance = %self.instance_id,
                        attempt = attempt + 1,
                        error = %e,
                        "Webhook send failed, retrying"
                    );
                    last_err = Some(e.into());
                }
            }
            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt))).await;
            }
        }

        match last_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

// Plugin

#[derive(Deserialize)]
struct WebhookConfig {
    url: String,
    body_template: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn parse_config(config: &Value) -> Result<WebhookConfig> {
    let cfg: WebhookConfig = serde_json::from_value(config.clone())
        .map_err(|e| NotifyError::InvalidConfig(format!("webhook: {e}")))?;
    if !cfg.url.starts_with("http://") && !cfg.url.starts_with("https://") {
        return Err(NotifyError::InvalidConfig(format!(
            "webhook: url must be http(s), got '{}'",
            cfg.url
        )));
    }
    Ok(cfg)
}

pub struct WebhookPlugin;

impl ChannelPlugin for WebhookPlugin {
    fn name(&self) -> &str {
        "webhook"
    }

    fn default_target(&self) -> Option<NotificationChannelKind> {
        Some(NotificationChannelKind::Webhook)
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        parse_config(config).map(|_| ())
    }

    fn create_channel(&self, instance_id: &str, config: &Value) -> Result<Arc<dyn NotificationChannel>> {
        let cfg = parse_config(config)?;
        Ok(Arc::new(WebhookChannel::new(
            instance_id,
            cfg.url,
            cfg.body_template,
            Duration::from_secs(cfg.timeout_secs),
        )?))
    }
}
