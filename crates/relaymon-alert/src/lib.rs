//! Declarative alert rules evaluated against metrics snapshots.
//!
//! Rules name snapshot fields through the typed table in [`field`], combine
//! their [`condition`]s with AND semantics, and may require a condition to
//! hold for a sustained duration. The [`engine::AlertEngine`] owns the
//! duration and cooldown state, creates [`types::Alert`]s for rules that
//! fire, and hands them to a [`NotificationSink`].

pub mod condition;
pub mod engine;
pub mod error;
pub mod field;
pub mod message;
pub mod rule;
pub mod state;
pub mod templates;
pub mod types;
pub mod validate;


pub use engine::{AlertEngine, EngineConfig};
pub use rule::{AlertCategory, AlertRule, AlertSeverity, NotificationChannelKind};
pub use types::{Alert, AlertContext, AlertEvaluationResult, AlertNotification};

use anyhow::Result;
use async_trait::async_trait;

/// Receiver for fired alerts.
///
/// The engine awaits each dispatch before evaluating the next rule. An
/// `Err` is logged by the engine and never aborts the cycle.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn dispatch(&self, notification: AlertNotification) -> Result<()>;
}
