use crate::health::{HealthAlert, HealthAlertKind};
use crate::stats::{LatencyMetrics, ThroughputMetrics};
use crate::status::OperationalStatus;

/// Advisory actions, most urgent first. Output is deterministic for a given
/// input.
pub fn generate_recommendations(
    status: OperationalStatus,
    alerts: &[HealthAlert],
    throughput: &ThroughputMetrics,
    latency: &LatencyMetrics,
) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();
    let failure_rate = 100.0 - throughput.success_rate;

    match status {
        OperationalStatus::Down => {
            out.push("Immediate investigation required - cross-system messaging is down");
            out.push("Check origin and destination endpoints and network connectivity");
            out.push("Verify messenger and receiver configurations");
        }
        OperationalStatus::Degraded => {
            out.push("Monitor system closely - performance is degraded");
        }
        _ => {}
    }

    if failure_rate > 20.0 {
        out.push("Critical failure rate detected - immediate action required");
        out.push("Check for network outages or infrastructure issues");
        out.push("Review recent deployments or configuration changes");
    } else if failure_rate > 10.0 {
        out.push("High failure rate detected - investigate error patterns");
        out.push("Monitor endpoint stability and response times");
    } else if failure_rate > 5.0 {
        out.push("Elevated failure rate - consider proactive monitoring");
    }

    if throughput.success_rate < 90.0 {
        out.push("Investigate frequent message failures");
        out.push("Review error logs for common failure patterns");
    }

    if latency.average_latency_ms > 60_000.0 {
        out.push("High latency detected - check network conditions");
    }

    if alerts
        .iter()
        .any(|a| a.kind == HealthAlertKind::ConsecutiveFailures)
    {
        out.push("CRITICAL: Multiple consecutive failures detected - system is DOWN");
        out.push("Check connectivity between origin and destination immediately");
        out.push("Verify the relay path is processing messages");
        out.push("Review recent infrastructure or configuration changes");
    }
    if alerts.iter().any(|a| a.kind.is_failure_rate()) {
        out.push("Analyze failed message patterns and error types");
    }

    if alerts.is_empty() && status == OperationalStatus::Active {
        out.push("System is operating normally");
    }

    out.into_iter().map(String::from).collect()
}
