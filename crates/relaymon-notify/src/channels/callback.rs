use crate::NotificationChannel;
use anyhow::Result;
use async_trait::async_trait;
use relaymon_alert::AlertNotification;
use std::future::Future;

/// Adapts an async closure into a [`NotificationChannel`].
pub struct FnChannel<F> {
    name: String,
    callback: F,
}

impl<F> FnChannel<F> {
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

#[async_trait]
impl<F, Fut> NotificationChannel for FnChannel<F>
where
    F: Fn(AlertNotification) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn send(&self, notification: &AlertNotification) -> Result<()> {
        (self.callback)(notification.clone()).await
    }

    fn channel_name(&self) -> &str {
        &self.name
    }
}
