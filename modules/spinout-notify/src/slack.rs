use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::DispatchError;
use crate::payload::NotificationPayload;
use crate::traits::NotifyBackend;

/// Posts a Block Kit message to a Slack incoming webhook.
pub struct SlackWebhook {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }
}

/// Block Kit body for a high-potential alert.
pub fn slack_message(payload: &NotificationPayload) -> Value {
    let publication = &payload.publication;
    let analysis = &payload.analysis;

    json!({
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": "High-Potential Publication Detected"
                }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Title:*\n{}", publication.title) },
                    { "type": "mrkdwn", "text": format!("*Score:*\n{:.1}/10", analysis.score) }
                ]
            },
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("*Summary:*\n{}", analysis.summary) }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Department:*\n{}", publication.department) },
                    {
                        "type": "mrkdwn",
                        "text": format!(
                            "*Time to Market:*\n{} months",
                            analysis.key_metrics.time_to_market_months
                        )
                    }
                ]
            }
        ]
    })
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&slack_message(payload))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(title = %payload.publication.title, "Slack notification delivered");
        Ok(())
    }
}
