use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

impl AiError {
    /// Whether a retry has a reasonable chance of succeeding.
    /// Rate limits, server errors, timeouts and connection failures are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Network(_) | AiError::Timeout => true,
            AiError::Api { status, .. } => *status == 429 || *status >= 500,
            AiError::Config(_) | AiError::Parse(_) | AiError::EmptyResponse => false,
        }
    }
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout
        } else if e.is_decode() {
            AiError::Parse(e.to_string())
        } else {
            AiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert!(AiError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(AiError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(AiError::Timeout.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!AiError::Api { status: 401, body: "bad key".into() }.is_retryable());
        assert!(!AiError::Parse("eof".into()).is_retryable());
        assert!(!AiError::EmptyResponse.is_retryable());
    }
}
