//! Transport side of the monitor: sends one probe message through the
//! relay and reports what happened as an [`Observation`].
//!
//! [`Probe`] is the seam the tracking loop depends on; [`http::HttpProbe`]
//! is the built-in implementation for relays that expose an HTTP submit
//! endpoint on the origin and a lookup endpoint on the destination.

pub mod error;
pub mod http;

#[cfg(test)]
mod tests;

pub use error::ProbeError;
pub use http::{HttpProbe, HttpProbeConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relaymon_common::types::Observation;

/// Raw timings and costs of one successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// When the origin acknowledged the message.
    pub sent_at: DateTime<Utc>,
    /// When the relayed counterpart was observed on the destination.
    pub relayed_at: DateTime<Utc>,
    pub send_cost: Option<u128>,
    pub relay_cost: Option<u128>,
}

impl ProbeOutcome {
    /// Relay latency in milliseconds. Clock skew never yields a negative
    /// value.
    pub fn latency_ms(&self) -> f64 {
        (self.relayed_at - self.sent_at).num_milliseconds().max(0) as f64
    }
}

/// Produces one probe round trip per call.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn probe(&self) -> error::Result<ProbeOutcome>;
}

/// Runs `probe` once and records the result. Failures become failed
/// observations; nothing is propagated.
pub async fn observe(probe: &dyn Probe) -> Observation {
    let started = Utc::now();
    match probe.probe().await {
        Ok(outcome) => {
            let latency_ms = outcome.latency_ms();
            tracing::info!(
                probe = probe.name(),
                latency_ms,
                send_cost = ?outcome.send_cost,
                relay_cost = ?outcome.relay_cost,
                "Probe relayed"
            );
            Observation::success(outcome.sent_at, latency_ms, outcome.send_cost, outcome.relay_cost)
        }
        Err(e) => {
            tracing::warn!(probe = probe.name(), kind = %e.kind, error = %e.message, "Probe failed");
            Observation::failure(started, e.kind, e.message)
        }
    }
}
