//! Polling loop that ties the workspace together: probe the relay, append
//! the observation, compute a snapshot, evaluate alert rules and dispatch
//! notifications, once per interval.

pub mod config;
pub mod tracker;

pub use config::TrackerConfig;
pub use tracker::{build_dispatcher, load_configured_rules, start_tracking, CycleReport, Tracker};
