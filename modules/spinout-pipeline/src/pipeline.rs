use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use spinout_common::Publication;
use spinout_notify::{Dispatcher, NotificationGate, NotificationPayload};
use spinout_scorer::Scorer;
use spinout_scraper::PublicationSource;
use spinout_store::{DedupStore, Stored};

use crate::stats::RunStats;

/// One full pass: collect, dedup + store, score, gate, notify, mark processed.
///
/// Publications are handled one at a time with a fixed delay in between.
/// Cancellation is observed between publications and during delays, never
/// in the middle of a network call.
pub struct Pipeline {
    source: Arc<dyn PublicationSource>,
    store: DedupStore,
    scorer: Scorer,
    gate: NotificationGate,
    dispatcher: Dispatcher,
    publication_delay: Duration,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PublicationSource>,
        store: DedupStore,
        scorer: Scorer,
        gate: NotificationGate,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            source,
            store,
            scorer,
            gate,
            dispatcher,
            publication_delay: Duration::from_secs(1),
        }
    }

    pub fn with_publication_delay(mut self, delay: Duration) -> Self {
        self.publication_delay = delay;
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> RunStats {
        let mut stats = RunStats::default();

        let publications = match self.source.fetch_all(cancel).await {
            Ok(publications) => publications,
            Err(e) => {
                error!(error = %e, "Collection failed, nothing to process");
                stats.collection_failures += 1;
                Vec::new()
            }
        };
        stats.fetched = publications.len() as u32;
        info!(count = stats.fetched, "Fetched publications");

        let total = publications.len();
        for (i, publication) in publications.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            self.process(publication, &mut stats).await;

            if i + 1 < total {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        stats.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.publication_delay) => {}
                }
            }
        }

        if stats.cancelled {
            warn!(processed = stats.processed, "Run cancelled");
        }
        info!("{stats}");
        stats
    }

    async fn process(&self, publication: &Publication, stats: &mut RunStats) {
        if !publication.is_valid() {
            debug!(title = %publication.title, "Skipping publication without title or authors");
            stats.invalid += 1;
            return;
        }

        let record = match self.store.store_with_outcome(publication).await {
            Ok(Stored::Existing(record)) if record.processed => {
                debug!(title = %publication.title, "Already processed, skipping");
                stats.skipped_duplicates += 1;
                return;
            }
            Ok(Stored::Existing(record)) => {
                info!(title = %publication.title, id = %record.id, "Resuming unprocessed publication");
                stats.resumed += 1;
                record
            }
            Ok(Stored::New(record)) => {
                stats.stored += 1;
                record
            }
            Err(e) => {
                error!(title = %publication.title, doi = %publication.doi, error = %e, "Storage failed, skipping");
                stats.storage_failures += 1;
                return;
            }
        };

        let analysis = match self.scorer.analyze_stored(&record).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(title = %publication.title, error = %e, "Analysis failed, will retry next run");
                stats.analysis_failures += 1;
                return;
            }
        };
        stats.analyzed += 1;
        if analysis.is_degraded() {
            stats.degraded += 1;
        }
        stats
            .scores
            .push((publication.title.clone(), analysis.startup_potential_score));

        if self.gate.should_notify(&analysis) {
            let payload = NotificationPayload::new(&record.publication, &analysis);
            let report = self.dispatcher.dispatch(&payload).await;
            stats.notified += 1;
            stats.dispatch_failures += report.failed.len() as u32;
            info!(
                title = %publication.title,
                score = analysis.startup_potential_score,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "High-potential publication"
            );
        }

        match self.store.mark_processed(record.id).await {
            Ok(()) => stats.processed += 1,
            Err(e) => {
                error!(title = %publication.title, id = %record.id, error = %e, "Failed to mark processed");
                stats.storage_failures += 1;
            }
        }
    }
}
