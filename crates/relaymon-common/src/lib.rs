//! Shared types for the relaymon workspace.
//!
//! An [`types::Observation`] is the unit every other crate consumes: one
//! probe cycle's outcome, produced by the transport layer and aggregated
//! by `relaymon-metrics`.

pub mod id;
pub mod types;
