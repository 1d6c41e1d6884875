use relaymon_common::types::{ErrorKind, Observation, RelayErrorKind, SendErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure tallies split by probe phase.
///
/// Every failed observation counts toward `total_errors`; only those with
/// an [`ErrorKind`] land in a phase bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub send_errors: BTreeMap<SendErrorKind, u64>,
    pub relay_errors: BTreeMap<RelayErrorKind, u64>,
    pub total_errors: u64,
    /// Percentage of observations that failed.
    pub error_rate: f64,
}

pub fn calculate_error_summary(observations: &[Observation]) -> ErrorSummary {
    let mut summary = ErrorSummary::default();

    for obs in observations.iter().filter(|o| !o.success) {
        summary.total_errors += 1;
        match obs.error_kind {
            Some(ErrorKind::Send(kind)) => *summary.send_errors.entry(kind).or_insert(0) += 1,
            Some(ErrorKind::Relay(kind)) => *summary.relay_errors.entry(kind).or_insert(0) += 1,
            None => {}
        }
    }

    if !observations.is_empty() {
        summary.error_rate = summary.total_errors as f64 * 100.0 / observations.len() as f64;
    }
    summary
}
