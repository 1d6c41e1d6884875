use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use relaymon_alert::templates::default_rules;
use relaymon_alert::{AlertNotification, NotificationChannelKind, NotificationSink};
use relaymon_common::types::{ErrorKind, Observation, RelayErrorKind, SendErrorKind};
use relaymon_metrics::health::HealthLevel;
use relaymon_metrics::status::OperationalStatus;
use relaymon_metrics::MetricsConfig;
use relaymon_probe::{Probe, ProbeError, ProbeOutcome};
use relaymon_tracker::{build_dispatcher, load_configured_rules, CycleReport, Tracker, TrackerConfig};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn ok(minute: i64) -> Observation {
    Observation::success(t0() + Duration::minutes(minute), 3_000.0, Some(60_000), Some(90_000))
}

fn fail(minute: i64) -> Observation {
    Observation::failure(
        t0() + Duration::minutes(minute),
        ErrorKind::Relay(RelayErrorKind::RelayTimeout),
        "relay not observed",
    )
}

/// Replays a fixed list of outcomes; repeats the last one when exhausted.
struct ScriptedProbe {
    outcomes: Mutex<VecDeque<Result<ProbeOutcome, ProbeError>>>,
    last: Result<ProbeOutcome, ProbeError>,
}

impl ScriptedProbe {
    fn new(outcomes: Vec<Result<ProbeOutcome, ProbeError>>) -> Self {
        let last = outcomes
            .last()
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::send(SendErrorKind::EndpointUnreachable, "no script")));
        Self {
            outcomes: Mutex::new(outcomes.into()),
            last,
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn probe(&self) -> relaymon_probe::error::Result<ProbeOutcome> {
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.clone())
    }
}

fn relayed(latency_secs: i64) -> Result<ProbeOutcome, ProbeError> {
    let sent_at = Utc::now();
    Ok(ProbeOutcome {
        sent_at,
        relayed_at: sent_at + Duration::seconds(latency_secs),
        send_cost: Some(60_000),
        relay_cost: Some(90_000),
    })
}

#[derive(Default)]
struct RecordingSink {
    received: Mutex<Vec<AlertNotification>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn dispatch(&self, notification: AlertNotification) -> anyhow::Result<()> {
        self.received.lock().unwrap().push(notification);
        Ok(())
    }
}

#[tokio::test]
async fn test_cycles_wait_for_metrics_threshold() {
    let probe = ScriptedProbe::new(vec![relayed(2), relayed(3), relayed(4)]);
    let mut tracker = Tracker::new(MetricsConfig::default(), default_rules()).with_metrics_threshold(3);

    assert!(tracker.run_cycle(&probe, None).await.is_none());
    assert!(tracker.run_cycle(&probe, None).await.is_none());
    assert!(tracker.previous_snapshot().is_none());

    let report = tracker.run_cycle(&probe, None).await.unwrap();
    assert!(report.success);
    assert_eq!(report.snapshot.core_metrics.throughput.total_messages, 3);
    assert_eq!(report.snapshot.status.operational_status, OperationalStatus::Active);
    assert_eq!(report.snapshot.core_metrics.latency.average_latency_ms, 3_000.0);
    assert!(report.fired.is_empty());
    assert_eq!(tracker.window().len(), 3);
}

#[tokio::test]
async fn test_failed_probe_is_recorded_not_raised() {
    let probe = ScriptedProbe::new(vec![Err(ProbeError::send(SendErrorKind::Rejected, "origin returned 500"))]);
    let mut tracker = Tracker::new(MetricsConfig::default(), Vec::new());

    let report = tracker.run_cycle(&probe, None).await.unwrap();
    assert!(!report.success);
    assert_eq!(report.observation.error_kind, Some(ErrorKind::Send(SendErrorKind::Rejected)));
    assert_eq!(report.snapshot.core_metrics.throughput.failed_messages, 1);
    assert_eq!(
        report.snapshot.health.error_summary.send_errors.get(&SendErrorKind::Rejected),
        Some(&1)
    );
}

#[tokio::test]
async fn test_consecutive_failures_take_the_system_down_and_notify() {
    let sink = RecordingSink::default();
    let mut tracker = Tracker::new(MetricsConfig::default(), default_rules());

    for minute in 0..10 {
        tracker.record(ok(minute), Some(&sink), t0() + Duration::minutes(minute)).await;
    }
    assert!(sink.received.lock().unwrap().is_empty());

    let mut last = None;
    for minute in 10..15 {
        last = tracker
            .record(fail(minute), Some(&sink), t0() + Duration::minutes(minute))
            .await;
    }
    let report = last.unwrap();

    assert_eq!(report.snapshot.status.operational_status, OperationalStatus::Down);
    assert!(report.snapshot.status.health_level >= HealthLevel::Critical);
    assert!(report.fired.iter().any(|a| a.id.starts_with("rule_consecutive_failures_")));

    let received = sink.received.lock().unwrap();
    let down = received
        .iter()
        .find(|n| n.rule.id == "rule_system_status_6")
        .expect("system down rule should notify");
    assert_eq!(
        down.channels,
        vec![
            NotificationChannelKind::Email,
            NotificationChannelKind::Slack,
            NotificationChannelKind::Sms
        ]
    );
    assert!(down.context.previous.is_some());
    assert_eq!(down.context.time_window_ms, 3_600_000);
}

#[tokio::test]
async fn test_cooldown_holds_across_cycles() {
    let sink = RecordingSink::default();
    let mut tracker = Tracker::new(MetricsConfig::default(), default_rules());

    for minute in 0..4 {
        tracker.record(fail(minute), Some(&sink), t0() + Duration::minutes(minute)).await;
    }
    assert!(sink
        .received
        .lock()
        .unwrap()
        .iter()
        .any(|n| n.rule.id == "rule_system_status_6"));

    // down since minute 0; the critical cooldown is five minutes
    let report = tracker
        .record(fail(4), Some(&sink), t0() + Duration::minutes(4))
        .await
        .unwrap();
    assert_eq!(report.snapshot.status.operational_status, OperationalStatus::Down);
    assert!(report
        .fired
        .iter()
        .all(|a| !a.id.starts_with("rule_system_status_6_")));
}

#[tokio::test]
async fn test_callback_errors_do_not_stop_the_loop() {
    let probe = ScriptedProbe::new(vec![relayed(1)]);
    let mut tracker = Tracker::new(MetricsConfig::default(), default_rules());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let callback = move |_report: &CycleReport| -> anyhow::Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("callback exploded")
    };

    let run = tracker.run_forever(&probe, None, Some(callback), std::time::Duration::from_millis(5));
    let _ = tokio::time::timeout(std::time::Duration::from_millis(300), run).await;

    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert!(tracker.previous_snapshot().is_some());
}

#[test]
fn test_empty_channel_config_logs_every_kind() {
    let dispatcher = build_dispatcher(&[]).unwrap();
    assert_eq!(dispatcher.kinds().len(), 6);
}

#[test]
fn test_rules_come_from_configured_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"[{
            "id": "slow-relay",
            "name": "Slow relay",
            "description": "Relay latency is high",
            "category": "LATENCY",
            "severity": "HIGH",
            "conditions": [
                { "field": "core_metrics.latency.average_latency_ms", "operator": "gt", "value": 45000 }
            ]
        }]"#,
    )
    .unwrap();

    let toml = format!(
        r#"
rules_path = "{}"

[probe]
origin_url = "https://origin.example.com/send"
destination_url = "https://destination.example.com/relayed"
"#,
        file.path().display()
    );
    let config: TrackerConfig = toml::from_str(&toml).unwrap();
    let rules = load_configured_rules(&config).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, "slow-relay");

    let defaults = TrackerConfig {
        rules_path: None,
        ..config
    };
    assert_eq!(load_configured_rules(&defaults).unwrap().len(), default_rules().len());
}
