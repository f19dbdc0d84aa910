use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use spinout_common::{Publication, RetryPolicy, StoredPublication};

use crate::error::{Result, StoreError};
use crate::traits::PublicationStore;

/// Result of [`DedupStore::store_with_outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    New(StoredPublication),
    Existing(StoredPublication),
}

impl Stored {
    pub fn into_record(self) -> StoredPublication {
        match self {
            Stored::New(r) | Stored::Existing(r) => r,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Stored::New(_))
    }
}

/// Deduplication over a [`PublicationStore`].
///
/// Identity is the DOI when one is present; otherwise an exact title match
/// whose author list shares at least one name with the candidate. Every call
/// into the backing store goes through the storage retry policy.
#[derive(Clone)]
pub struct DedupStore {
    inner: Arc<dyn PublicationStore>,
    retry: RetryPolicy,
}

impl DedupStore {
    pub fn new(inner: Arc<dyn PublicationStore>, retry: RetryPolicy) -> Self {
        Self { inner, retry }
    }

    /// Look up an already-stored record for `candidate`.
    ///
    /// A DOI hit short-circuits. Otherwise the first same-title record with an
    /// overlapping author wins; a same-title record with disjoint authors is a
    /// different publication.
    pub async fn find_existing(&self, candidate: &Publication) -> Result<Option<StoredPublication>> {
        if let Some(doi) = candidate.doi() {
            let hit = self
                .retry
                .run("find_by_doi", StoreError::is_retryable, || {
                    self.inner.find_by_doi(doi)
                })
                .await?;
            if hit.is_some() {
                return Ok(hit);
            }
        }

        let same_title = self
            .retry
            .run("find_by_title", StoreError::is_retryable, || {
                self.inner.find_by_title(&candidate.title)
            })
            .await?;

        Ok(same_title
            .into_iter()
            .find(|existing| candidate.shares_author_with(&existing.publication.authors)))
    }

    /// Store `candidate` unless it is already known. Returns the existing
    /// record unchanged when found, otherwise the newly inserted one
    /// (`processed = false`, `scraped_at = now`).
    pub async fn store(&self, candidate: &Publication) -> Result<StoredPublication> {
        self.store_with_outcome(candidate).await.map(Stored::into_record)
    }

    /// Like [`store`](Self::store), but reports whether a row was written.
    pub async fn store_with_outcome(&self, candidate: &Publication) -> Result<Stored> {
        if let Some(existing) = self.find_existing(candidate).await? {
            debug!(title = %candidate.title, id = %existing.id, "Publication already stored");
            return Ok(Stored::Existing(existing));
        }

        let record = StoredPublication::new(candidate.clone(), Utc::now());
        let stored = self
            .retry
            .run("insert_publication", StoreError::is_retryable, || {
                self.inner.insert(record.clone())
            })
            .await?;

        // A different id means a concurrent writer claimed the DOI first.
        if stored.id != record.id {
            return Ok(Stored::Existing(stored));
        }
        info!(title = %candidate.title, id = %stored.id, "Stored new publication");
        Ok(Stored::New(stored))
    }

    pub async fn mark_processed(&self, id: Uuid) -> Result<()> {
        let at = Utc::now();
        self.retry
            .run("mark_processed", StoreError::is_retryable, || {
                self.inner.mark_processed(id, at)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::memory::MemoryPublicationStore;

    fn authors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn dedup() -> (DedupStore, Arc<MemoryPublicationStore>) {
        let memory = Arc::new(MemoryPublicationStore::new());
        (DedupStore::new(memory.clone(), RetryPolicy::none()), memory)
    }

    #[tokio::test]
    async fn new_publication_is_stored_unprocessed() {
        let (store, memory) = dedup();
        let candidate = Publication::new("X", authors(&["A", "B"]));

        assert!(store.find_existing(&candidate).await.unwrap().is_none());
        let stored = store.store(&candidate).await.unwrap();

        assert!(!stored.processed);
        assert!(stored.processed_at.is_none());
        assert_eq!(stored.publication, candidate);
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn same_doi_different_title_is_duplicate() {
        let (store, memory) = dedup();
        let first = store
            .store(&Publication::new("Original", authors(&["A"])).with_doi("10.1000/xyz"))
            .await
            .unwrap();
        let second = store
            .store(&Publication::new("Renamed", authors(&["Z"])).with_doi("10.1000/xyz"))
            .await
            .unwrap();

        assert_eq!(second, first);
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn same_title_shared_author_is_duplicate() {
        let (store, memory) = dedup();
        let first = store
            .store(&Publication::new("T", authors(&["A", "B"])))
            .await
            .unwrap();
        let found = store
            .find_existing(&Publication::new("T", authors(&["B", "C"])))
            .await
            .unwrap();

        assert_eq!(found.map(|r| r.id), Some(first.id));
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn same_title_disjoint_authors_is_distinct() {
        let (store, memory) = dedup();
        let first = store
            .store(&Publication::new("T", authors(&["A"])))
            .await
            .unwrap();
        let second = store
            .store(&Publication::new("T", authors(&["B"])))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(memory.len(), 2);
    }

    #[tokio::test]
    async fn doi_miss_falls_back_to_title() {
        let (store, _) = dedup();
        let first = store
            .store(&Publication::new("T", authors(&["A"])))
            .await
            .unwrap();
        let found = store
            .find_existing(&Publication::new("T", authors(&["A"])).with_doi("10.1/new"))
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(first.id));
    }

    #[tokio::test]
    async fn outcome_reports_new_then_existing() {
        let (store, _) = dedup();
        let candidate = Publication::new("X", authors(&["A"]));

        let first = store.store_with_outcome(&candidate).await.unwrap();
        let second = store.store_with_outcome(&candidate).await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.into_record().id, second.into_record().id);
    }

    #[tokio::test]
    async fn storing_twice_persists_once() {
        let (store, memory) = dedup();
        let candidate = Publication::new("X", authors(&["A", "B"]));

        let first = store.store(&candidate).await.unwrap();
        let second = store.store(&candidate).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(memory.len(), 1);
    }

    #[tokio::test]
    async fn existing_record_is_returned_unchanged() {
        let (store, _) = dedup();
        let first = store
            .store(&Publication::new("X", authors(&["A"])))
            .await
            .unwrap();
        store.mark_processed(first.id).await.unwrap();

        let again = store
            .store(&Publication::new("X", authors(&["A"])).with_abstract("new text"))
            .await
            .unwrap();
        assert!(again.processed);
        assert!(again.processed_at.is_some());
        assert_eq!(again.publication.abstract_text, "");
    }

    /// Fails the first `failures` lookups with a pool timeout.
    struct Flaky {
        inner: MemoryPublicationStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl PublicationStore for Flaky {
        async fn find_by_doi(&self, doi: &str) -> Result<Option<StoredPublication>> {
            self.inner.find_by_doi(doi).await
        }

        async fn find_by_title(&self, title: &str) -> Result<Vec<StoredPublication>> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.find_by_title(title).await
        }

        async fn insert(&self, record: StoredPublication) -> Result<StoredPublication> {
            self.inner.insert(record).await
        }

        async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
            self.inner.mark_processed(id, at).await
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
            max_backoff: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn transient_lookup_failure_is_retried() {
        let flaky = Arc::new(Flaky {
            inner: MemoryPublicationStore::new(),
            failures: AtomicU32::new(2),
        });
        let store = DedupStore::new(flaky, fast_retry(3));

        let stored = store
            .store(&Publication::new("X", authors(&["A"])))
            .await
            .unwrap();
        assert!(!stored.processed);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_storage_error() {
        let flaky = Arc::new(Flaky {
            inner: MemoryPublicationStore::new(),
            failures: AtomicU32::new(5),
        });
        let store = DedupStore::new(flaky, fast_retry(2));

        let err = store
            .store(&Publication::new("X", authors(&["A"])))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
