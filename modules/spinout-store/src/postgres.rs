// Postgres persistence for publications.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use spinout_common::{Publication, StoredPublication};

use crate::error::{Result, StoreError};
use crate::traits::PublicationStore;

const COLUMNS: &str = "id, title, authors, abstract, publication_date, department, url, doi, \
                       publication_type, processed, scraped_at, processed_at";

/// A row from the publications table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PublicationRow {
    id: Uuid,
    title: String,
    authors: Vec<String>,
    #[sqlx(rename = "abstract")]
    abstract_text: String,
    publication_date: String,
    department: String,
    url: String,
    doi: String,
    publication_type: String,
    processed: bool,
    scraped_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<PublicationRow> for StoredPublication {
    fn from(row: PublicationRow) -> Self {
        StoredPublication {
            id: row.id,
            publication: Publication {
                title: row.title,
                authors: row.authors,
                abstract_text: row.abstract_text,
                publication_date: row.publication_date,
                department: row.department,
                url: row.url,
                doi: row.doi,
                publication_type: row.publication_type,
            },
            processed: row.processed,
            scraped_at: row.scraped_at,
            processed_at: row.processed_at,
        }
    }
}

pub struct PgPublicationStore {
    pool: PgPool,
}

impl PgPublicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a bounded acquire timeout so a dead database surfaces as a
    /// retryable `PoolTimedOut` instead of hanging the run.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        info!("Connected to Postgres");
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PublicationStore for PgPublicationStore {
    async fn find_by_doi(&self, doi: &str) -> Result<Option<StoredPublication>> {
        let row = sqlx::query_as::<_, PublicationRow>(&format!(
            "SELECT {COLUMNS} FROM publications WHERE doi = $1 AND doi <> '' LIMIT 1"
        ))
        .bind(doi)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_title(&self, title: &str) -> Result<Vec<StoredPublication>> {
        let rows = sqlx::query_as::<_, PublicationRow>(&format!(
            "SELECT {COLUMNS} FROM publications WHERE title = $1 ORDER BY scraped_at ASC, id ASC"
        ))
        .bind(title)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, record: StoredPublication) -> Result<StoredPublication> {
        let p = &record.publication;
        let doi = p.doi().unwrap_or_default();

        let inserted = sqlx::query_as::<_, PublicationRow>(&format!(
            r#"
            INSERT INTO publications
                (id, title, authors, abstract, publication_date, department, url, doi,
                 publication_type, processed, scraped_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (doi) WHERE doi <> '' DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(record.id)
        .bind(&p.title)
        .bind(&p.authors)
        .bind(&p.abstract_text)
        .bind(&p.publication_date)
        .bind(&p.department)
        .bind(&p.url)
        .bind(doi)
        .bind(&p.publication_type)
        .bind(record.processed)
        .bind(record.scraped_at)
        .bind(record.processed_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }

        // Lost the race on the DOI index: hand back the winner.
        debug!(doi, "Insert hit existing DOI, returning stored record");
        self.find_by_doi(doi)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn mark_processed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE publications
            SET processed = TRUE,
                processed_at = COALESCE(processed_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
