use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use spinout_common::Config;

use crate::email::EmailNotifier;
use crate::error::DispatchError;
use crate::payload::NotificationPayload;
use crate::slack::SlackWebhook;
use crate::traits::NotifyBackend;

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    /// (channel, error message)
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fans a payload out to every enabled channel concurrently. Each channel's
/// error is captured on its own; one failing channel never blocks another.
#[derive(Clone, Default)]
pub struct Dispatcher {
    backends: Vec<Arc<dyn NotifyBackend>>,
}

impl Dispatcher {
    pub fn new(backends: Vec<Arc<dyn NotifyBackend>>) -> Self {
        Self { backends }
    }

    /// Build the enabled channels from configuration.
    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        let timeout = config.request_timeout;
        let mut backends: Vec<Arc<dyn NotifyBackend>> = Vec::new();

        if let Some(slack) = &config.slack {
            backends.push(Arc::new(SlackWebhook::new(&slack.webhook_url, timeout)?));
        }
        if let Some(email) = &config.email {
            backends.push(Arc::new(EmailNotifier::new(email, timeout)?));
        }

        if backends.is_empty() {
            warn!("No notification channels enabled, alerts will only be logged");
        }
        Ok(Self::new(backends))
    }

    pub fn channels(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub async fn dispatch(&self, payload: &NotificationPayload) -> DispatchReport {
        let sends = self.backends.iter().map(|backend| async move {
            (backend.name().to_string(), backend.send(payload).await)
        });

        let mut report = DispatchReport::default();
        for (channel, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => {
                    info!(channel = %channel, title = %payload.publication.title, "Notification sent");
                    report.delivered.push(channel);
                }
                Err(e) => {
                    warn!(channel = %channel, title = %payload.publication.title, error = %e, "Notification failed");
                    report.failed.push((channel, e.to_string()));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::payload::tests::sample_payload;

    /// Records every title it is asked to send, or always fails.
    struct RecordingBackend {
        name: &'static str,
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NotifyBackend for RecordingBackend {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
            if self.fail {
                return Err(DispatchError::Rejected {
                    status: 500,
                    body: "boom".into(),
                });
            }
            self.sent.lock().unwrap().push(payload.publication.title.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_others() {
        let broken = RecordingBackend::new("slack", true);
        let working = RecordingBackend::new("email", false);
        let backends: Vec<Arc<dyn NotifyBackend>> = vec![broken, working.clone()];
        let dispatcher = Dispatcher::new(backends);

        let report = dispatcher.dispatch(&sample_payload()).await;

        assert_eq!(report.delivered, vec!["email".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "slack");
        assert!(!report.all_delivered());
        assert_eq!(*working.sent.lock().unwrap(), vec!["Quantum Sensors".to_string()]);
    }

    #[tokio::test]
    async fn no_channels_is_an_empty_report() {
        let report = Dispatcher::default().dispatch(&sample_payload()).await;
        assert!(report.delivered.is_empty());
        assert!(report.all_delivered());
    }

    #[test]
    fn config_without_channels_builds_empty_dispatcher() {
        let config = Config::from_lookup(|key| (key == "OPENAI_API_KEY").then(|| "sk".to_string()))
            .unwrap();
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn config_with_slack_builds_slack_channel() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk".to_string()),
            "SLACK_ENABLED" => Some("true".to_string()),
            "SLACK_WEBHOOK_URL" => Some("https://hooks.slack.com/services/T/B/X".to_string()),
            _ => None,
        })
        .unwrap();
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert_eq!(dispatcher.channels(), vec!["slack"]);
    }
}
