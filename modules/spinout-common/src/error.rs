use thiserror::Error;

/// Startup configuration problems. These are the only fatal errors: the
/// process aborts before any publication is touched.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{channel} notifications are enabled but {key} is not set")]
    ChannelIncomplete {
        channel: &'static str,
        key: &'static str,
    },
}
