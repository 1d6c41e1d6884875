use crate::channels::callback::FnChannel;
use crate::NotificationChannel;
use async_trait::async_trait;
use relaymon_alert::{AlertNotification, NotificationChannelKind, NotificationSink};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of delivering one notification.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: Vec<NotificationChannelKind>,
    pub failed: Vec<(NotificationChannelKind, String)>,
    /// Requested targets with no registered channel.
    pub skipped: Vec<NotificationChannelKind>,
    /// Channel tasks that panicked or were cancelled.
    pub aborted: usize,
}

/// Routes notifications to registered channels by kind.
///
/// A notification with explicit target channels goes only to those
/// (missing ones are skipped with a warning); one without targets goes to
/// every registered channel. All deliveries run concurrently and the
/// dispatcher waits for each to finish. A failing channel never stops the
/// others.
#[derive(Default, Clone)]
pub struct ChannelDispatcher {
    channels: BTreeMap<NotificationChannelKind, Arc<dyn NotificationChannel>>,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: NotificationChannelKind, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(kind, channel);
    }

    /// Registers an async callback for `kind`.
    pub fn register_fn<F, Fut>(&mut self, kind: NotificationChannelKind, callback: F)
    where
        F: Fn(AlertNotification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = kind.as_str().to_lowercase();
        self.register(kind, Arc::new(FnChannel::new(name, callback)));
    }

    pub fn kinds(&self) -> Vec<NotificationChannelKind> {
        self.channels.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn targets(
        &self,
        requested: &[NotificationChannelKind],
        summary: &mut DispatchSummary,
    ) -> Vec<(NotificationChannelKind, Arc<dyn NotificationChannel>)> {
        if requested.is_empty() {
            return self
                .channels
                .iter()
                .map(|(kind, channel)| (*kind, Arc::clone(channel)))
                .collect();
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for kind in requested {
            if !seen.insert(*kind) {
                continue;
            }
            match self.channels.get(kind) {
                Some(channel) => targets.push((*kind, Arc::clone(channel))),
                None => {
                    tracing::warn!(
                        channel = %kind,
                        "No callback configured for notification channel, skipping"
                    );
                    summary.skipped.push(*kind);
                }
            }
        }
        targets
    }

    /// Delivers `notification` and reports what happened to each target.
    pub async fn deliver(&self, notification: AlertNotification) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let targets = self.targets(&notification.channels, &mut summary);
        let alert_id = notification.alert.id.clone();
        let notification = Arc::new(notification);

        let mut tasks = JoinSet::new();
        for (kind, channel) in targets {
            let notification = Arc::clone(&notification);
            tasks.spawn(async move {
                let result = channel.send(&notification).await;
                (kind, channel.channel_name().to_string(), result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, name, Ok(()))) => {
                    tracing::debug!(channel = %name, alert_id = %alert_id, "Notification sent");
                    summary.delivered.push(kind);
                }
                Ok((kind, name, Err(e))) => {
                    tracing::error!(
                        channel = %name,
                        alert_id = %alert_id,
                        error = %e,
                        "Failed to send notification"
                    );
                    summary.failed.push((kind, e.to_string()));
                }
                Err(e) => {
                    tracing::error!(alert_id = %alert_id, error = %e, "Notification task aborted");
                    summary.aborted += 1;
                }
            }
        }

        summary.delivered.sort();
        summary.failed.sort();
        summary
    }
}

#[async_trait]
impl NotificationSink for ChannelDispatcher {
    async fn dispatch(&self, notification: AlertNotification) -> anyhow::Result<()> {
        self.deliver(notification).await;
        Ok(())
    }
}
