use crate::snapshot::MetricsSnapshot;
use std::fmt::Write;

/// Multi-line human-readable summary of a snapshot, for logs and status
/// messages.
pub fn render_report(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let status = &snapshot.status;
    let core = &snapshot.core_metrics;
    let health = &snapshot.health;

    let _ = writeln!(out, "System Status:");
    let _ = writeln!(out, "  - Operational Status: {}", status.operational_status);
    let _ = writeln!(out, "  - Timing Status: {}", status.timing_status);
    let _ = writeln!(out, "  - Health Level: {}", status.health_level);
    let _ = writeln!(
        out,
        "  - Data Window: {} to {}",
        status.window_start.to_rfc3339(),
        status.window_end.to_rfc3339()
    );

    let t = &core.throughput;
    let _ = writeln!(out, "Throughput:");
    let _ = writeln!(out, "  - Total Messages: {}", t.total_messages);
    let _ = writeln!(out, "  - Successful: {}", t.successful_messages);
    let _ = writeln!(out, "  - Failed: {}", t.failed_messages);
    let _ = writeln!(out, "  - Success Rate: {:.2}%", t.success_rate);
    let _ = writeln!(out, "  - Messages/Hour: {:.2}", t.messages_per_hour);

    let l = &core.latency;
    let _ = writeln!(out, "Latency:");
    for (label, value) in [
        ("Average", l.average_latency_ms),
        ("Median", l.median_latency_ms),
        ("Min", l.min_latency_ms),
        ("Max", l.max_latency_ms),
        ("P95", l.p95_latency_ms),
        ("P99", l.p99_latency_ms),
    ] {
        let _ = writeln!(out, "  - {label}: {:.2}s", value / 1000.0);
    }

    let g = &core.gas;
    let _ = writeln!(out, "Gas Usage:");
    let _ = writeln!(out, "  - Avg Send Gas: {}", g.average_send_gas);
    let _ = writeln!(out, "  - Avg Relay Gas: {}", g.average_relay_gas);
    let _ = writeln!(out, "  - Total Gas Used: {}", g.total_gas_used);

    let tm = &core.timing;
    let _ = writeln!(out, "Timing:");
    let _ = writeln!(out, "  - On Time: {}", tm.on_time_messages);
    let _ = writeln!(out, "  - Delayed: {}", tm.delayed_messages);
    let _ = writeln!(out, "  - Severely Delayed: {}", tm.severely_delayed_messages);
    let _ = writeln!(out, "  - Average Delay: {:.2}s", tm.average_delay_ms / 1000.0);

    if !health.alerts.is_empty() {
        let _ = writeln!(out, "Health Alerts:");
        for (i, alert) in health.alerts.iter().enumerate() {
            let _ = writeln!(out, "  {}. [{}] {}: {}", i + 1, alert.level, alert.kind, alert.message);
        }
    }

    let errors = &health.error_summary;
    if errors.total_errors > 0 {
        let _ = writeln!(out, "Error Summary:");
        let _ = writeln!(out, "  - Total Errors: {}", errors.total_errors);
        let _ = writeln!(out, "  - Error Rate: {:.2}%", errors.error_rate);
        for (kind, count) in &errors.send_errors {
            let _ = writeln!(out, "  - Send {}: {}", kind.as_str(), count);
        }
        for (kind, count) in &errors.relay_errors {
            let _ = writeln!(out, "  - Relay {}: {}", kind.as_str(), count);
        }
    }

    if !health.recommendations.is_empty() {
        let _ = writeln!(out, "Recommendations:");
        for (i, rec) in health.recommendations.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, rec);
        }
    }

    out
}
