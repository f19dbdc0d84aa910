use async_trait::async_trait;

use crate::error::DispatchError;
use crate::payload::NotificationPayload;

/// One delivery channel (Slack, email, ...).
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Short channel name used in logs and dispatch reports.
    fn name(&self) -> &str;

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError>;
}
