use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use spinout_common::EmailConfig;

use crate::error::DispatchError;
use crate::payload::NotificationPayload;
use crate::traits::NotifyBackend;

/// Sends an HTML alert over STARTTLS SMTP.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self, DispatchError> {
        let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            mailer,
            from: parse_mailbox(&config.from_email)?,
            to: parse_mailbox(&config.to_email)?,
        })
    }

    fn build_message(&self, payload: &NotificationPayload) -> Result<Message, DispatchError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email_subject(payload))
            .header(ContentType::TEXT_HTML)
            .body(email_body(payload))?)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DispatchError> {
    address.parse().map_err(|e: lettre::address::AddressError| DispatchError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

pub fn email_subject(payload: &NotificationPayload) -> String {
    format!(
        "High-Potential Publication Alert: {}",
        payload.publication.title
    )
}

pub fn email_body(payload: &NotificationPayload) -> String {
    let publication = &payload.publication;
    let analysis = &payload.analysis;
    let metrics = &analysis.key_metrics;

    let next_steps: String = analysis
        .recommendations
        .next_steps
        .iter()
        .map(|step| format!("<li>{}</li>", escape_html(step)))
        .collect();

    format!(
        r#"<html>
<body>
<h2>High-Potential Publication Detected</h2>
<h3>Publication Details</h3>
<p><strong>Title:</strong> {title}</p>
<p><strong>Authors:</strong> {authors}</p>
<p><strong>Department:</strong> {department}</p>
<p><strong>Score:</strong> {score:.1}/10</p>

<h3>Analysis Summary</h3>
<p>{summary}</p>

<h3>Key Metrics</h3>
<ul>
<li>Time to Market: {months} months</li>
<li>Investment Level: {investment}</li>
<li>Risk Level: {risk}</li>
</ul>

<h3>Next Steps</h3>
<ul>{next_steps}</ul>

<p><a href="{url}">View Publication</a></p>
</body>
</html>
"#,
        title = escape_html(&publication.title),
        authors = escape_html(&publication.authors.join(", ")),
        department = escape_html(&publication.department),
        score = analysis.score,
        summary = escape_html(&analysis.summary),
        months = metrics.time_to_market_months,
        investment = metrics.investment_level,
        risk = metrics.risk_level,
        url = escape_html(&publication.url),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[async_trait]
impl NotifyBackend for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DispatchError> {
        let message = self.build_message(payload)?;
        let response = self.mailer.send(message).await?;
        debug!(
            title = %payload.publication.title,
            code = %response.code(),
            "Email notification delivered"
        );
        Ok(())
    }
}
