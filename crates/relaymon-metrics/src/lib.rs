//! Aggregation of probe observations into health statistics.
//!
//! Each evaluation cycle appends one [`Observation`] to an
//! [`window::ObservationWindow`]; [`snapshot::generate_snapshot`] then runs
//! the pure calculators in [`stats`], derives the operational status and
//! health alerts, and assembles an immutable [`snapshot::MetricsSnapshot`].
//!
//! [`Observation`]: relaymon_common::types::Observation

pub mod config;
pub mod health;
pub mod recommendations;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod status;
pub mod window;

#[cfg(test)]
mod tests;

pub use config::MetricsConfig;
pub use snapshot::{generate_snapshot, MetricsSnapshot};
pub use window::ObservationWindow;
