//! Wires production collaborators from a [`Config`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use ai_client::OpenAi;
use spinout_common::Config;
use spinout_notify::{Dispatcher, NotificationGate};
use spinout_scorer::Scorer;
use spinout_scraper::PortalScraper;
use spinout_store::{DedupStore, MemoryPublicationStore, PgPublicationStore, PublicationStore};

use crate::pipeline::Pipeline;

/// Where publications are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Nothing survives the process. For dry runs.
    Memory,
}

pub async fn build_pipeline(config: &Config, backend: StoreBackend) -> Result<Pipeline> {
    let inner: Arc<dyn PublicationStore> = match backend {
        StoreBackend::Postgres => {
            let url = config.require_database_url()?;
            let pg = PgPublicationStore::connect(url, config.request_timeout)
                .await
                .context("Failed to connect to Postgres")?;
            pg.migrate().await.context("Failed to run migrations")?;
            Arc::new(pg)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, nothing will be persisted");
            Arc::new(MemoryPublicationStore::new())
        }
    };
    let store = DedupStore::new(inner, config.storage_retry.clone());

    let mut openai = OpenAi::with_timeout(
        &config.openai_api_key,
        &config.openai_model,
        config.request_timeout,
    )
    .context("Failed to build OpenAI client")?;
    if !ai_client::supports_structured_output(openai.model()) {
        warn!(model = %openai.model(), "Model lacks structured outputs, broad analysis will use JSON mode");
    }
    if let Some(url) = &config.openai_base_url {
        openai = openai.with_base_url(url);
    }
    let scorer = Scorer::new(Arc::new(openai))
        .with_retry(config.llm_retry.clone())
        .with_temperature(config.openai_temperature);

    let source = PortalScraper::new(&config.portal_base_url, config.request_timeout)
        .context("Failed to build portal scraper")?
        .with_max_pages(config.scraper_max_pages)
        .with_page_delay(config.page_delay);

    let dispatcher =
        Dispatcher::from_config(config).context("Failed to set up notification channels")?;
    info!(channels = ?dispatcher.channels(), "Notification channels ready");

    Ok(Pipeline::new(
        Arc::new(source),
        store,
        scorer,
        NotificationGate::new(config.score_threshold),
        dispatcher,
    )
    .with_publication_delay(config.publication_delay))
}
