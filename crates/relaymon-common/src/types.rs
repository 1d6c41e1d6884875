use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure raised while submitting the probe message on the origin side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendErrorKind {
    /// The origin endpoint could not be reached.
    EndpointUnreachable,
    /// The origin accepted the connection but rejected the message.
    Rejected,
    /// The origin never acknowledged the message within the send timeout.
    AckTimeout,
    /// The acknowledgement did not carry the fields needed to track the relay.
    MalformedAck,
}

/// Failure raised while waiting for the relayed counterpart on the
/// destination side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayErrorKind {
    /// No counterpart event appeared before the relay timeout.
    RelayTimeout,
    /// Watching the destination failed (connection dropped, bad status).
    WatchFailed,
    /// A counterpart event was found but could not be decoded.
    MalformedEvent,
}

/// Typed error taxonomy for failed observations, split by the phase of the
/// probe in which the failure happened.
///
/// # Examples
///
/// ```
/// use relaymon_common::types::{ErrorKind, SendErrorKind};
///
/// let kind = ErrorKind::Send(SendErrorKind::Rejected);
/// assert!(kind.is_send_phase());
/// assert_eq!(kind.to_string(), "send:REJECTED");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "kind", rename_all = "lowercase")]
pub enum ErrorKind {
    Send(SendErrorKind),
    Relay(RelayErrorKind),
}

impl ErrorKind {
    pub fn is_send_phase(&self) -> bool {
        matches!(self, Self::Send(_))
    }

    pub fn is_relay_phase(&self) -> bool {
        matches!(self, Self::Relay(_))
    }
}

impl SendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndpointUnreachable => "ENDPOINT_UNREACHABLE",
            Self::Rejected => "REJECTED",
            Self::AckTimeout => "ACK_TIMEOUT",
            Self::MalformedAck => "MALFORMED_ACK",
        }
    }
}

impl RelayErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelayTimeout => "RELAY_TIMEOUT",
            Self::WatchFailed => "WATCH_FAILED",
            Self::MalformedEvent => "MALFORMED_EVENT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send(kind) => write!(f, "send:{}", kind.as_str()),
            Self::Relay(kind) => write!(f, "relay:{}", kind.as_str()),
        }
    }
}

/// One probe cycle's outcome.
///
/// Created once per cycle by the transport layer and never mutated
/// afterwards. Latency and cost fields are only meaningful when `success`
/// is true; failed observations carry an [`ErrorKind`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Time between the send acknowledgement and the relayed counterpart.
    pub latency_ms: Option<f64>,
    /// Cost (gas) consumed by the send leg.
    pub send_cost: Option<u128>,
    /// Cost (gas) consumed by the relay leg.
    pub relay_cost: Option<u128>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
}

impl Observation {
    pub fn success(
        timestamp: DateTime<Utc>,
        latency_ms: f64,
        send_cost: Option<u128>,
        relay_cost: Option<u128>,
    ) -> Self {
        Self {
            timestamp,
            success: true,
            latency_ms: Some(latency_ms),
            send_cost,
            relay_cost,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failure(timestamp: DateTime<Utc>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            success: false,
            latency_ms: None,
            send_cost: None,
            relay_cost: None,
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_serializes_with_phase_tag() {
        let kind = ErrorKind::Relay(RelayErrorKind::RelayTimeout);
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["phase"], "relay");
        assert_eq!(json["kind"], "RELAY_TIMEOUT");

        let back: ErrorKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn test_failure_observation_has_no_latency() {
        let obs = Observation::failure(
            Utc::now(),
            ErrorKind::Send(SendErrorKind::EndpointUnreachable),
            "connection refused",
        );
        assert!(!obs.success);
        assert!(obs.latency_ms.is_none());
        assert_eq!(obs.error_message.as_deref(), Some("connection refused"));
    }
}
