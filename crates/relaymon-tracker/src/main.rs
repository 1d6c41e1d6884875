use anyhow::Result;
use relaymon_metrics::report::render_report;
use relaymon_tracker::{start_tracking, CycleReport, TrackerConfig};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("relaymon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/tracker.toml".to_string());

    let config = TrackerConfig::load(&config_path)?;
    tracing::info!(
        path = %config_path,
        origin = %config.probe.origin_url,
        destination = %config.probe.destination_url,
        interval_minutes = config.interval_minutes,
        "relaymon-tracker starting"
    );

    let report = |cycle: &CycleReport| -> Result<()> {
        tracing::info!("Metrics report:\n{}", render_report(&cycle.snapshot));
        for alert in &cycle.fired {
            tracing::info!(alert_id = %alert.id, severity = %alert.severity, title = %alert.title, "Alert fired");
        }
        Ok(())
    };

    tokio::select! {
        result = start_tracking(config, Some(report)) => result?,
        _ = signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
