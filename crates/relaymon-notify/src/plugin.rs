use crate::dispatcher::ChannelDispatcher;
use crate::error::{NotifyError, Result};
use crate::NotificationChannel;
use relaymon_alert::NotificationChannelKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory for creating [`NotificationChannel`] instances from JSON
/// configuration.
///
/// Each plugin is registered in the [`ChannelRegistry`] by its `name()`.
pub trait ChannelPlugin: Send + Sync {
    /// Returns the plugin type name (e.g., `"slack"`, `"webhook"`).
    fn name(&self) -> &str;

    /// Logical channel this plugin serves when a config entry names no
    /// targets.
    fn default_target(&self) -> Option<NotificationChannelKind>;

    /// Validates a JSON config blob against this plugin's expected schema.
    fn validate_config(&self, config: &Value) -> Result<()>;

    /// Creates a configured channel instance from a validated JSON config.
    fn create_channel(&self, instance_id: &str, config: &Value) -> Result<Arc<dyn NotificationChannel>>;

    /// Returns a copy of `config` with secrets redacted, for logging.
    fn redact_config(&self, config: &Value) -> Value {
        crate::utils::redact_sensitive_json(config)
    }
}

/// One configured channel instance: which plugin builds it, which logical
/// targets it serves, and the plugin's options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub plugin: String,
    #[serde(default)]
    pub targets: Vec<NotificationChannelKind>,
    #[serde(default)]
    pub config: Value,
}

/// Registry of available [`ChannelPlugin`]s, used to instantiate
/// notification channels from configuration.
///
/// # Examples
///
/// ```
/// use relaymon_notify::plugin::ChannelRegistry;
///
/// let registry = ChannelRegistry::default();
/// assert!(registry.has_plugin("log"));
/// assert!(registry.has_plugin("webhook"));
/// assert!(registry.has_plugin("slack"));
/// assert!(!registry.has_plugin("nonexistent"));
/// ```
pub struct ChannelRegistry {
    plugins: HashMap<String, Box<dyn ChannelPlugin>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn ChannelPlugin>) {
        let name = plugin.name().to_string();
        self.plugins.insert(name, plugin);
    }

    pub fn create_channel(
        &self,
        type_name: &str,
        instance_id: &str,
        config: &Value,
    ) -> Result<Arc<dyn NotificationChannel>> {
        let plugin = self
            .plugins
            .get(type_name)
            .ok_or_else(|| NotifyError::UnknownChannelType(type_name.to_string()))?;
        plugin.validate_config(config)?;
        plugin.create_channel(instance_id, config)
    }

    pub fn get_plugin(&self, type_name: &str) -> Option<&dyn ChannelPlugin> {
        self.plugins.get(type_name).map(|p| p.as_ref())
    }

    pub fn has_plugin(&self, type_name: &str) -> bool {
        self.plugins.contains_key(type_name)
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.keys().map(|s| s.as_str()).collect()
    }

    /// Instantiates every entry and registers it under its targets. An
    /// entry without targets uses the plugin's default target; a plugin
    /// without one (such as `log`) must list its targets explicitly.
    pub fn build_dispatcher(&self, entries: &[ChannelEntry]) -> Result<ChannelDispatcher> {
        let mut dispatcher = ChannelDispatcher::new();
        for (index, entry) in entries.iter().enumerate() {
            let plugin = self
                .get_plugin(&entry.plugin)
                .ok_or_else(|| NotifyError::UnknownChannelType(entry.plugin.clone()))?;

            let targets = if entry.targets.is_empty() {
                match plugin.default_target() {
                    Some(kind) => vec![kind],
                    None => {
                        return Err(NotifyError::InvalidConfig(format!(
                            "channel '{}' needs explicit targets",
                            entry.plugin
                        )))
                    }
                }
            } else {
                entry.targets.clone()
            };

            let instance_id = format!("{}-{}", entry.plugin, index + 1);
            let channel = self.create_channel(&entry.plugin, &instance_id, &entry.config)?;
            tracing::info!(
                instance = %instance_id,
                targets = ?targets,
                config = %plugin.redact_config(&entry.config),
                "Notification channel configured"
            );
            for kind in targets {
                dispatcher.register(kind, Arc::clone(&channel));
            }
        }
        Ok(dispatcher)
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::channels::log::LogPlugin));
        registry.register(Box::new(crate::channels::webhook::WebhookPlugin));
        registry.register(Box::new(crate::channels::slack::SlackPlugin));
        registry
    }
}
