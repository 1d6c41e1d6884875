//! Notification fan-out for fired alerts.
//!
//! A [`dispatcher::ChannelDispatcher`] maps each logical
//! [`NotificationChannelKind`] to a [`NotificationChannel`] and delivers a
//! notification to every targeted channel concurrently. Built-in channels
//! (log, webhook, Slack) are created from configuration through the
//! [`plugin::ChannelRegistry`]; arbitrary async callbacks can be registered
//! with [`channels::callback::FnChannel`].
//!
//! [`NotificationChannelKind`]: relaymon_alert::NotificationChannelKind

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod plugin;
pub mod utils;


pub use dispatcher::{ChannelDispatcher, DispatchSummary};

use anyhow::Result;
use async_trait::async_trait;
use relaymon_alert::AlertNotification;

/// A notification delivery channel that sends alert notifications to an
/// external service or callback.
///
/// Implementations should bound their own network time; the dispatcher
/// waits for every channel it started.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers the notification through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails after retries (if applicable).
    async fn send(&self, notification: &AlertNotification) -> Result<()>;

    /// Returns the channel type name (e.g., `"slack"`, `"webhook"`).
    fn channel_name(&self) -> &str;
}
