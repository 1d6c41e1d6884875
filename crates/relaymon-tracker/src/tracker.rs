use crate::config::TrackerConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use relaymon_alert::templates::default_rules;
use relaymon_alert::types::DEFAULT_TIME_WINDOW_MS;
use relaymon_alert::validate::load_rules;
use relaymon_alert::{Alert, AlertContext, AlertEngine, AlertRule, EngineConfig, NotificationChannelKind, NotificationSink};
use relaymon_common::types::Observation;
use relaymon_metrics::{generate_snapshot, MetricsConfig, MetricsSnapshot, ObservationWindow};
use relaymon_notify::plugin::{ChannelEntry, ChannelRegistry};
use relaymon_notify::ChannelDispatcher;
use relaymon_probe::{observe, HttpProbe, Probe};
use std::time::Duration;

/// What one completed cycle produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub observation: Observation,
    /// Whether this cycle's probe succeeded.
    pub success: bool,
    pub snapshot: MetricsSnapshot,
    /// Alerts fired this cycle.
    pub fired: Vec<Alert>,
}

/// Polling loop state: the observation window, the alert engine and the
/// previous cycle's snapshot.
///
/// A cycle runs to completion (probe, window, snapshot, rules, dispatch)
/// before the next one starts.
pub struct Tracker {
    metrics: MetricsConfig,
    metrics_threshold: usize,
    alert_time_window_ms: u64,
    window: ObservationWindow,
    engine: AlertEngine,
    rules: Vec<AlertRule>,
    previous: Option<MetricsSnapshot>,
}

impl Tracker {
    pub fn new(metrics: MetricsConfig, rules: Vec<AlertRule>) -> Self {
        Self {
            window: ObservationWindow::new(metrics.max_window_entries),
            metrics,
            metrics_threshold: 1,
            alert_time_window_ms: DEFAULT_TIME_WINDOW_MS,
            engine: AlertEngine::new(EngineConfig::default()),
            rules,
            previous: None,
        }
    }

    pub fn from_config(config: &TrackerConfig, rules: Vec<AlertRule>) -> Self {
        Self::new(config.metrics.clone(), rules)
            .with_metrics_threshold(config.metrics_threshold)
            .with_alert_time_window_ms(config.alert_time_window_ms())
            .with_engine_config(config.engine.clone())
    }

    pub fn with_metrics_threshold(mut self, threshold: usize) -> Self {
        self.metrics_threshold = threshold;
        self
    }

    pub fn with_alert_time_window_ms(mut self, window_ms: u64) -> Self {
        self.alert_time_window_ms = window_ms;
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine = AlertEngine::new(config);
        self
    }

    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    pub fn previous_snapshot(&self) -> Option<&MetricsSnapshot> {
        self.previous.as_ref()
    }

    /// Probes once and runs the rest of the cycle. Returns `None` while the
    /// window holds fewer than `metrics_threshold` observations.
    pub async fn run_cycle(
        &mut self,
        probe: &dyn Probe,
        sink: Option<&dyn NotificationSink>,
    ) -> Option<CycleReport> {
        let observation = observe(probe).await;
        self.record(observation, sink, Utc::now()).await
    }

    /// Appends `observation` and, once the window is large enough, computes
    /// a snapshot and evaluates the rules as of `now`.
    pub async fn record(
        &mut self,
        observation: Observation,
        sink: Option<&dyn NotificationSink>,
        now: DateTime<Utc>,
    ) -> Option<CycleReport> {
        let success = observation.success;
        self.window.append(observation.clone());

        if self.window.len() < self.metrics_threshold {
            tracing::debug!(
                observations = self.window.len(),
                threshold = self.metrics_threshold,
                "Window below metrics threshold, skipping evaluation"
            );
            return None;
        }

        let observations = self.window.snapshot();
        let snapshot = generate_snapshot(&observations, &self.metrics, now);
        let ctx = AlertContext::new(snapshot, observations)
            .with_previous(self.previous.take())
            .with_time_window_ms(self.alert_time_window_ms);

        let fired: Vec<Alert> = self
            .engine
            .evaluate_at(&self.rules, &ctx, sink, now)
            .await
            .into_iter()
            .filter_map(|result| result.alert)
            .collect();

        tracing::info!(
            success,
            status = %ctx.snapshot.status.operational_status,
            health = %ctx.snapshot.status.health_level,
            success_rate = ctx.snapshot.core_metrics.throughput.success_rate,
            fired = fired.len(),
            "Tracking cycle complete"
        );

        let snapshot = ctx.snapshot;
        self.previous = Some(snapshot.clone());
        Some(CycleReport {
            observation,
            success,
            snapshot,
            fired,
        })
    }

    /// Runs cycles until the future is dropped, sleeping `interval` after
    /// each one. A callback error is logged and the next cycle is
    /// scheduled as usual.
    pub async fn run_forever<F>(
        &mut self,
        probe: &dyn Probe,
        sink: Option<&dyn NotificationSink>,
        mut callback: Option<F>,
        interval: Duration,
    ) where
        F: FnMut(&CycleReport) -> anyhow::Result<()>,
    {
        tracing::info!(
            probe = probe.name(),
            interval_secs = interval.as_secs(),
            rules = self.rules.len(),
            "Starting tracking loop"
        );
        loop {
            if let Some(report) = self.run_cycle(probe, sink).await {
                if let Some(cb) = callback.as_mut() {
                    if let Err(e) = cb(&report) {
                        tracing::error!(error = %e, "Tracking callback failed");
                    }
                }
            }
            tracing::debug!(interval_secs = interval.as_secs(), "Waiting for next tracking cycle");
            tokio::time::sleep(interval).await;
        }
    }
}

/// Rules from `config.rules_path`, or the default set.
pub fn load_configured_rules(config: &TrackerConfig) -> anyhow::Result<Vec<AlertRule>> {
    match &config.rules_path {
        Some(path) => load_rules(path).with_context(|| format!("failed to load rules from {path}")),
        None => {
            let rules = default_rules();
            tracing::info!(count = rules.len(), "Using default alert rules");
            Ok(rules)
        }
    }
}

/// Dispatcher for the configured channels. With none configured, every
/// notification kind is routed to the log channel.
pub fn build_dispatcher(entries: &[ChannelEntry]) -> anyhow::Result<ChannelDispatcher> {
    let registry = ChannelRegistry::default();
    if entries.is_empty() {
        let fallback = ChannelEntry {
            plugin: "log".to_string(),
            targets: vec![
                NotificationChannelKind::Email,
                NotificationChannelKind::Slack,
                NotificationChannelKind::Webhook,
                NotificationChannelKind::Sms,
                NotificationChannelKind::Discord,
                NotificationChannelKind::Telegram,
            ],
            config: serde_json::Value::Null,
        };
        return Ok(registry.build_dispatcher(&[fallback])?);
    }
    Ok(registry.build_dispatcher(entries)?)
}

/// Builds the probe, rules and dispatcher described by `config` and tracks
/// forever.
pub async fn start_tracking<F>(config: TrackerConfig, callback: Option<F>) -> anyhow::Result<()>
where
    F: FnMut(&CycleReport) -> anyhow::Result<()>,
{
    let rules = load_configured_rules(&config)?;
    let dispatcher = build_dispatcher(&config.channels)?;
    let probe = HttpProbe::new(config.probe.clone()).context("failed to build HTTP probe")?;

    let mut tracker = Tracker::from_config(&config, rules);
    tracker
        .run_forever(&probe, Some(&dispatcher), callback, config.interval())
        .await;
    Ok(())
}
