use relaymon_alert::EngineConfig;
use relaymon_metrics::MetricsConfig;
use relaymon_notify::plugin::ChannelEntry;
use relaymon_probe::HttpProbeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Origin and destination endpoints plus the credential token.
    pub probe: HttpProbeConfig,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Observations required in the window before snapshots and alert
    /// rules run.
    #[serde(default = "default_metrics_threshold")]
    pub metrics_threshold: usize,
    /// Look-back window reported in alert messages.
    #[serde(default = "default_alert_time_window_minutes")]
    pub alert_time_window_minutes: u64,
    /// JSON rule file. The default rule set is used when absent.
    #[serde(default)]
    pub rules_path: Option<String>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

fn default_interval_minutes() -> u64 {
    10
}

fn default_metrics_threshold() -> usize {
    1
}

fn default_alert_time_window_minutes() -> u64 {
    60
}

impl TrackerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.interval_minutes == 0 {
            anyhow::bail!("interval_minutes must be at least 1");
        }
        if self.metrics.max_window_entries == 0 {
            anyhow::bail!("metrics.max_window_entries must be at least 1");
        }
        if self.metrics_threshold > self.metrics.max_window_entries {
            anyhow::bail!(
                "metrics_threshold ({}) exceeds metrics.max_window_entries ({})",
                self.metrics_threshold,
                self.metrics.max_window_entries
            );
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn alert_time_window_ms(&self) -> u64 {
        self.alert_time_window_minutes * 60 * 1000
    }
}
