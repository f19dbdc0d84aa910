/// A single channel failed to deliver. Other channels are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
