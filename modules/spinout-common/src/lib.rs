pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::{Config, EmailConfig, SlackConfig, DEFAULT_SCORE_THRESHOLD};
pub use error::ConfigError;
pub use retry::RetryPolicy;
pub use types::*;
