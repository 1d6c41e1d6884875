use relaymon_common::types::{ErrorKind, RelayErrorKind, SendErrorKind};

/// A failed probe, classified by the phase it failed in.
///
/// # Examples
///
/// ```rust
/// use relaymon_probe::error::ProbeError;
/// use relaymon_common::types::RelayErrorKind;
///
/// let err = ProbeError::relay(RelayErrorKind::RelayTimeout, "no counterpart after 600s");
/// assert!(err.kind.is_relay_phase());
/// assert_eq!(err.to_string(), "Probe: relay:RELAY_TIMEOUT: no counterpart after 600s");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Probe: {kind}: {message}")]
pub struct ProbeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProbeError {
    pub fn send(kind: SendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Send(kind),
            message: message.into(),
        }
    }

    pub fn relay(kind: RelayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Relay(kind),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
