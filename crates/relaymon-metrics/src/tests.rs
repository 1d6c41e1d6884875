use crate::config::MetricsConfig;
use crate::health::{determine_health_level, HealthAlertKind, HealthLevel};
use crate::report::render_report;
use crate::snapshot::generate_snapshot;
use crate::stats::{
    calculate_error_summary, calculate_gas_metrics, calculate_latency_metrics,
    calculate_throughput_metrics, calculate_timing_metrics, percentile, TimingStatus,
};
use crate::status::{consecutive_failure_count, has_consecutive_failures, OperationalStatus};
use crate::window::ObservationWindow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use num_bigint::BigUint;
use relaymon_common::types::{ErrorKind, Observation, RelayErrorKind, SendErrorKind};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn ok(minute: i64, latency_ms: f64) -> Observation {
    Observation::success(
        base_time() + Duration::minutes(minute),
        latency_ms,
        Some(50_000),
        Some(80_000),
    )
}

fn fail(minute: i64) -> Observation {
    Observation::failure(
        base_time() + Duration::minutes(minute),
        ErrorKind::Relay(RelayErrorKind::RelayTimeout),
        "relay not observed",
    )
}

fn now() -> DateTime<Utc> {
    base_time() + Duration::hours(2)
}

// ── Window ──

#[test]
fn test_window_at_capacity_discards_oldest() {
    let mut window = ObservationWindow::new(3);
    for i in 0..3 {
        window.append(ok(i, 1000.0));
    }
    assert_eq!(window.len(), 3);

    window.append(ok(10, 2000.0));
    assert_eq!(window.len(), 3);
    let contents = window.snapshot();
    assert_eq!(contents[0].timestamp, base_time() + Duration::minutes(1));
    assert_eq!(contents[2].timestamp, base_time() + Duration::minutes(10));
}

#[test]
fn test_window_snapshot_is_detached_copy() {
    let mut window = ObservationWindow::new(5);
    window.append(ok(0, 1000.0));
    let copy = window.snapshot();
    window.append(ok(1, 1000.0));
    assert_eq!(copy.len(), 1);
    assert_eq!(window.len(), 2);
}

// ── Calculators ──

#[test]
fn test_throughput_counts_add_up() {
    let data = vec![ok(0, 1000.0), fail(1), ok(2, 1000.0), fail(3)];
    let t = calculate_throughput_metrics(&data);
    assert_eq!(t.total_messages, 4);
    assert_eq!(t.successful_messages + t.failed_messages, t.total_messages);
    assert_eq!(t.success_rate, 50.0);
    // 4 messages over 3 minutes
    assert!((t.messages_per_hour - 80.0).abs() < 1e-9);
}

#[test]
fn test_throughput_single_point_has_no_rate() {
    let t = calculate_throughput_metrics(&[ok(0, 1000.0)]);
    assert_eq!(t.messages_per_hour, 0.0);
    assert_eq!(t.success_rate, 100.0);

    let empty = calculate_throughput_metrics(&[]);
    assert_eq!(empty.success_rate, 0.0);
    assert_eq!(empty.total_messages, 0);
}

#[test]
fn test_latency_uses_successful_points_only() {
    let data = vec![ok(0, 4000.0), fail(1), ok(2, 1000.0), ok(3, 3000.0), ok(4, 2000.0)];
    let l = calculate_latency_metrics(&data);
    assert_eq!(l.min_latency_ms, 1000.0);
    assert_eq!(l.max_latency_ms, 4000.0);
    assert_eq!(l.average_latency_ms, 2500.0);
    assert_eq!(l.median_latency_ms, 2500.0);
}

#[test]
fn test_latency_odd_count_median_is_middle() {
    let data = vec![ok(0, 5.0), ok(1, 1.0), ok(2, 3.0)];
    assert_eq!(calculate_latency_metrics(&data).median_latency_ms, 3.0);
}

#[test]
fn test_latency_empty_is_zeroed() {
    let l = calculate_latency_metrics(&[fail(0)]);
    assert_eq!(l.average_latency_ms, 0.0);
    assert_eq!(l.p99_latency_ms, 0.0);
}

#[test]
fn test_percentile_bounds_and_monotonicity() {
    let values = [3.0, 8.0, 15.0, 16.0, 42.0, 100.0];
    assert_eq!(percentile(&values, 0.0), 3.0);
    assert_eq!(percentile(&values, 1.0), 100.0);

    let mut previous = f64::MIN;
    for step in 0..=100 {
        let p = percentile(&values, step as f64 / 100.0);
        assert!(p >= previous, "percentile decreased at step {step}");
        previous = p;
    }
}

#[test]
fn test_gas_averages_truncate_and_skip_failures() {
    let mut a = ok(0, 1000.0);
    a.send_cost = Some(10);
    a.relay_cost = Some(100);
    let mut b = ok(1, 1000.0);
    b.send_cost = Some(15);
    b.relay_cost = Some(300);
    let data = vec![a, fail(2), b];

    let g = calculate_gas_metrics(&data);
    assert_eq!(g.average_send_gas, BigUint::from(12u32));
    assert_eq!(g.average_relay_gas, BigUint::from(200u32));
    assert_eq!(g.total_gas_used, BigUint::from(425u32));
    assert_eq!(g.min_send_gas, BigUint::from(10u32));
    assert_eq!(g.max_relay_gas, BigUint::from(300u32));

    assert_eq!(calculate_gas_metrics(&[fail(0)]), crate::stats::GasMetrics::default());
}

#[test]
fn test_gas_totals_do_not_clamp_near_u128_max() {
    let half = u128::MAX / 2 + 1;
    let mut a = ok(0, 1000.0);
    a.send_cost = Some(half);
    a.relay_cost = None;
    let mut b = ok(1, 1000.0);
    b.send_cost = Some(half);
    b.relay_cost = Some(u128::MAX);
    let g = calculate_gas_metrics(&[a, b]);

    assert_eq!(g.average_send_gas, BigUint::from(half));
    let expected_total = BigUint::from(half) * 2u32 + BigUint::from(u128::MAX);
    assert_eq!(g.total_gas_used, expected_total);
    assert!(g.total_gas_used > BigUint::from(u128::MAX));
    assert_eq!(g.max_relay_gas, BigUint::from(u128::MAX));

    let json = serde_json::to_value(&g).unwrap();
    assert_eq!(json["total_gas_used"], expected_total.to_string());
    let back: crate::stats::GasMetrics = serde_json::from_value(json).unwrap();
    assert_eq!(back, g);
}

#[test]
fn test_timing_classifies_against_thresholds() {
    let config = MetricsConfig::default();
    // 8 on time, 2 severely delayed: 20% > 10%
    let mut data: Vec<Observation> = (0..8).map(|i| ok(i, 1000.0)).collect();
    data.push(ok(8, 400_000.0));
    data.push(ok(9, 400_000.0));
    let t = calculate_timing_metrics(&data, &config);
    assert_eq!(t.on_time_messages, 8);
    assert_eq!(t.severely_delayed_messages, 2);
    assert_eq!(t.timing_status, TimingStatus::SeverelyDelayed);

    // 7 on time, 3 delayed: 30% > 20%
    let mut data: Vec<Observation> = (0..7).map(|i| ok(i, 1000.0)).collect();
    data.extend((7..10).map(|i| ok(i, 120_000.0)));
    assert_eq!(calculate_timing_metrics(&data, &config).timing_status, TimingStatus::Delayed);

    // exactly 20% delayed stays on time
    let mut data: Vec<Observation> = (0..8).map(|i| ok(i, 1000.0)).collect();
    data.extend((8..10).map(|i| ok(i, 120_000.0)));
    assert_eq!(calculate_timing_metrics(&data, &config).timing_status, TimingStatus::OnTime);
}

#[test]
fn test_error_summary_buckets_by_phase() {
    let data = vec![
        ok(0, 1000.0),
        fail(1),
        Observation::failure(base_time(), ErrorKind::Send(SendErrorKind::Rejected), "nope"),
        Observation::failure(base_time(), ErrorKind::Send(SendErrorKind::Rejected), "nope"),
    ];
    let s = calculate_error_summary(&data);
    assert_eq!(s.total_errors, 3);
    assert_eq!(s.error_rate, 75.0);
    assert_eq!(s.send_errors.get(&SendErrorKind::Rejected), Some(&2));
    assert_eq!(s.relay_errors.get(&RelayErrorKind::RelayTimeout), Some(&1));
}

// ── Status derivation ──

#[test]
fn test_five_failures_is_down() {
    let data: Vec<Observation> = (0..5).map(fail).collect();
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Down);
    assert!(snapshot
        .health
        .alerts
        .iter()
        .any(|a| a.kind == HealthAlertKind::ConsecutiveFailures));
}

#[test]
fn test_fewer_than_threshold_all_failures_is_down() {
    let data = vec![fail(0), fail(1)];
    assert!(has_consecutive_failures(&data, 5));
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Down);
    let alert = snapshot
        .health
        .alerts
        .iter()
        .find(|a| a.kind == HealthAlertKind::ConsecutiveFailures)
        .unwrap();
    assert!(alert.message.contains("All 2 tracked attempts"));
    assert_eq!(alert.context.is_all_failures, Some(true));
}

#[test]
fn test_consecutive_count_stops_at_success() {
    let data = vec![fail(0), ok(1, 1000.0), fail(2), fail(3)];
    assert_eq!(consecutive_failure_count(&data), 2);
    assert!(!has_consecutive_failures(&data, 3));
}

#[test]
fn test_five_percent_failures_is_active_and_healthy() {
    let mut data: Vec<Observation> = (0..19).map(|i| ok(i, 5000.0)).collect();
    data.push(fail(19));
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Active);
    assert_eq!(snapshot.status.health_level, HealthLevel::Healthy);
    assert!(snapshot.health.alerts.is_empty());
    assert_eq!(
        snapshot.health.recommendations,
        vec!["System is operating normally".to_string()]
    );
}

#[test]
fn test_critical_latency_is_down() {
    let data: Vec<Observation> = (0..10).map(|i| ok(i, 150_000.0)).collect();
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Down);
    let alert = snapshot
        .health
        .alerts
        .iter()
        .find(|a| a.kind == HealthAlertKind::CriticalLatency)
        .unwrap();
    assert_eq!(alert.level, HealthLevel::Critical);
    assert_eq!(snapshot.status.health_level, HealthLevel::Critical);
}

#[test]
fn test_elevated_failure_rate_is_degraded() {
    // 10% failures, no trailing run
    let mut data: Vec<Observation> = (0..18).map(|i| ok(i, 1000.0)).collect();
    data.insert(3, fail(100));
    data.insert(9, fail(101));
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Degraded);
    assert_eq!(snapshot.status.health_level, HealthLevel::Warning);
    let kinds: Vec<_> = snapshot.health.alerts.iter().map(|a| a.kind).collect();
    assert!(kinds.contains(&HealthAlertKind::HighFailureRate));
    assert!(kinds.contains(&HealthAlertKind::DegradedSuccessRate));
}

#[test]
fn test_health_level_picks_highest() {
    assert_eq!(determine_health_level(&[]), HealthLevel::Healthy);

    let data: Vec<Observation> = (0..10).map(fail).collect();
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    assert_eq!(determine_health_level(&snapshot.health.alerts), HealthLevel::Critical);
}

// ── Snapshot assembly ──

#[test]
fn test_empty_window_is_unknown() {
    let snapshot = generate_snapshot(&[], &MetricsConfig::default(), now());
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Unknown);
    assert_eq!(
        snapshot.health.recommendations,
        vec!["No data available for analysis".to_string()]
    );
}

#[test]
fn test_snapshot_aggregates_only_latest_entries() {
    let config = MetricsConfig {
        max_window_entries: 5,
        ..Default::default()
    };
    // old failures fall outside the retained window
    let mut data: Vec<Observation> = (0..10).map(fail).collect();
    data.extend((10..15).map(|i| ok(i, 1000.0)));
    let snapshot = generate_snapshot(&data, &config, now());
    assert_eq!(snapshot.core_metrics.throughput.total_messages, 5);
    assert_eq!(snapshot.status.operational_status, OperationalStatus::Active);
    assert_eq!(snapshot.status.window_start, base_time() + Duration::minutes(10));
    assert_eq!(snapshot.status.window_end, base_time() + Duration::minutes(14));
}

#[test]
fn test_snapshot_serializes_with_screaming_enums() {
    let data: Vec<Observation> = (0..5).map(fail).collect();
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["status"]["operational_status"], "DOWN");
    assert_eq!(json["health"]["alerts"][0]["kind"], "CONSECUTIVE_FAILURES");
}

#[test]
fn test_report_mentions_status_and_recommendations() {
    let data: Vec<Observation> = (0..5).map(fail).collect();
    let snapshot = generate_snapshot(&data, &MetricsConfig::default(), now());
    let report = render_report(&snapshot);
    assert!(report.contains("Operational Status: DOWN"));
    assert!(report.contains("Relay RELAY_TIMEOUT: 5"));
    assert!(report.contains("Recommendations:"));
}
