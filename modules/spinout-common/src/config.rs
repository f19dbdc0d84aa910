use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

pub const DEFAULT_PORTAL_URL: &str = "https://portal.fis.tum.de/en/publications/";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_SCORE_THRESHOLD: f64 = 7.0;
/// Every Monday at 00:00 UTC (sec min hour dom month dow year).
pub const DEFAULT_SCHEDULE: &str = "0 0 0 * * Mon *";

/// Slack incoming-webhook channel settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SlackConfig {
    pub webhook_url: String,
}

/// SMTP email channel settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from_email: String,
    pub to_email: String,
}

/// Process configuration, built once at startup and handed to each
/// component's constructor.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: Option<String>,

    // AI / LLM
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub openai_temperature: f32,

    // Scraping
    pub portal_base_url: String,
    pub scraper_max_pages: u32,

    // Scoring / notification
    pub score_threshold: f64,
    pub slack: Option<SlackConfig>,
    pub email: Option<EmailConfig>,

    // Timeouts, retries, pacing
    pub request_timeout: Duration,
    pub llm_retry: RetryPolicy,
    pub storage_retry: RetryPolicy,
    pub publication_delay: Duration,
    pub page_delay: Duration,

    // Trigger
    pub schedule_cron: String,
    pub run_immediately: bool,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let slack = if env.flag("SLACK_ENABLED")? {
            Some(SlackConfig {
                webhook_url: env.channel_key("Slack", "SLACK_WEBHOOK_URL")?,
            })
        } else {
            None
        };

        let email = if env.flag("EMAIL_ENABLED")? {
            Some(EmailConfig {
                smtp_server: env.channel_key("Email", "SMTP_SERVER")?,
                smtp_port: env
                    .channel_key("Email", "SMTP_PORT")
                    .and_then(|raw| parse_value("SMTP_PORT", &raw))?,
                smtp_user: env.channel_key("Email", "SMTP_USER")?,
                smtp_password: env.channel_key("Email", "SMTP_PASSWORD")?,
                from_email: env.channel_key("Email", "FROM_EMAIL")?,
                to_email: env.channel_key("Email", "TO_EMAIL")?,
            })
        } else {
            None
        };

        let score_threshold: f64 = env.parsed("SCORE_THRESHOLD", DEFAULT_SCORE_THRESHOLD)?;
        if !score_threshold.is_finite() {
            return Err(ConfigError::Invalid {
                key: "SCORE_THRESHOLD",
                value: score_threshold.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        let config = Self {
            database_url: env.optional("DATABASE_URL"),
            openai_api_key: env.required("OPENAI_API_KEY")?,
            openai_model: env
                .optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: env.optional("OPENAI_BASE_URL"),
            openai_temperature: env.parsed("OPENAI_TEMPERATURE", 0.7)?,
            portal_base_url: env
                .optional("PORTAL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string()),
            scraper_max_pages: env.parsed("SCRAPER_MAX_PAGES", 200)?,
            score_threshold,
            slack,
            email,
            request_timeout: Duration::from_secs(env.parsed("REQUEST_TIMEOUT_SECS", 60)?),
            llm_retry: RetryPolicy::new(
                env.parsed("LLM_MAX_ATTEMPTS", 3)?,
                Duration::from_millis(env.parsed("LLM_INITIAL_BACKOFF_MS", 1000)?),
            ),
            storage_retry: RetryPolicy::new(
                env.parsed("STORAGE_MAX_ATTEMPTS", 3)?,
                Duration::from_millis(env.parsed("STORAGE_INITIAL_BACKOFF_MS", 200)?),
            ),
            publication_delay: Duration::from_millis(env.parsed("PUBLICATION_DELAY_MS", 1000)?),
            page_delay: Duration::from_millis(env.parsed("PAGE_DELAY_MS", 1000)?),
            schedule_cron: env
                .optional("SCHEDULE_CRON")
                .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string()),
            run_immediately: env.flag("RUN_IMMEDIATELY")?,
        };

        Ok(config)
    }

    /// The database URL, which is required for every mode except in-memory runs.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    /// Log the loaded configuration with secrets reduced to a short preview.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }

        info!("Config loaded:");
        info!("  DATABASE_URL: {}", self.database_url.as_deref().map(preview).unwrap_or_else(|| "<not set>".to_string()));
        info!("  OPENAI_API_KEY: {}", preview(&self.openai_api_key));
        info!("  OPENAI_MODEL: {}", self.openai_model);
        info!("  PORTAL_BASE_URL: {}", self.portal_base_url);
        info!("  SCORE_THRESHOLD: {}", self.score_threshold);
        info!("  SLACK: {}", if self.slack.is_some() { "enabled" } else { "disabled" });
        match &self.email {
            Some(email) => info!("  EMAIL: enabled ({}:{} -> {})", email.smtp_server, email.smtp_port, email.to_email),
            None => info!("  EMAIL: disabled"),
        }
        info!("  SCHEDULE_CRON: {}", self.schedule_cron);
    }
}

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn channel_key(&self, channel: &'static str, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or(ConfigError::ChannelIncomplete { channel, key })
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &'static str) -> Result<bool, ConfigError> {
        match self.optional(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) => match v.as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    value: v,
                    reason: "expected true or false".to_string(),
                }),
            },
        }
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
