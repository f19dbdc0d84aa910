use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spinout_common::StoredPublication;

use crate::error::Result;

/// Persistence boundary for scraped publications.
///
/// Implementations only answer lookups and perform writes; the dedup decision
/// (DOI first, then title + shared author) lives in [`crate::DedupStore`].
#[async_trait]
pub trait PublicationStore: Send + Sync {
    async fn find_by_doi(&self, doi: &str) -> Result<Option<StoredPublication>>;

    /// All records with exactly this title, oldest first.
    async fn find_by_title(&self, title: &str) -> Result<Vec<StoredPublication>>;

    /// Insert `record`. If a record with the same non-empty DOI already exists
    /// the existing one is returned and nothing is written.
    async fn insert(&self, record: StoredPublication) -> Result<StoredPublication>;

    /// Flip `processed` to true and stamp `processed_at`. Errors with
    /// `NotFound` for an unknown id.
    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}
