#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Portal returned {status} for {url}")]
    Status { status: u16, url: String },
}
