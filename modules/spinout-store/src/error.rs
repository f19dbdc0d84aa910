use uuid::Uuid;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("No stored publication with id {0}")]
    NotFound(Uuid),
}

impl StoreError {
    /// Connection-level failures and serialization conflicts are worth another
    /// attempt. Constraint violations and missing rows are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Database(e) => match e {
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
                sqlx::Error::Database(db) => db
                    .code()
                    .map(|code| {
                        code.starts_with("08") || code == "40001" || code == "40P01"
                    })
                    .unwrap_or(false),
                _ => false,
            },
            StoreError::Migration(_) | StoreError::NotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_retryable() {
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn missing_row_is_not_retryable() {
        assert!(!StoreError::NotFound(Uuid::new_v4()).is_retryable());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_retryable());
    }
}
