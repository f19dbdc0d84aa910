use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spinout_common::StoredPublication;

use crate::error::{Result, StoreError};
use crate::traits::PublicationStore;

/// In-process store for tests and `--in-memory` dry runs. Records are kept in
/// insertion order; the DOI check and the push happen under one lock.
#[derive(Default)]
pub struct MemoryPublicationStore {
    records: Mutex<Vec<StoredPublication>>,
}

impl MemoryPublicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn records(&self) -> Vec<StoredPublication> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredPublication>> {
        // A poisoned lock only means another test thread panicked mid-push.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PublicationStore for MemoryPublicationStore {
    async fn find_by_doi(&self, doi: &str) -> Result<Option<StoredPublication>> {
        if doi.trim().is_empty() {
            return Ok(None);
        }
        Ok(self
            .lock()
            .iter()
            .find(|r| r.publication.doi() == Some(doi.trim()))
            .cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<StoredPublication>> {
        Ok(self
            .lock()
            .iter()
            .filter(|r| r.publication.title == title)
            .cloned()
            .collect())
    }

    async fn insert(&self, record: StoredPublication) -> Result<StoredPublication> {
        let mut records = self.lock();
        if let Some(doi) = record.publication.doi() {
            if let Some(existing) = records.iter().find(|r| r.publication.doi() == Some(doi)) {
                return Ok(existing.clone());
            }
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut records = self.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if !record.processed {
            record.processed = true;
            record.processed_at = Some(at);
        }
        Ok(())
    }
}
