use chrono::{DateTime, Utc};
use serde::Serialize;

use spinout_common::{AnalysisResult, KeyMetrics, Publication, Recommendations};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub department: String,
    pub url: String,
    pub publication_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub score: f64,
    pub summary: String,
    pub key_metrics: KeyMetrics,
    pub recommendations: Recommendations,
}

/// Channel-agnostic content of a high-potential alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub timestamp: DateTime<Utc>,
    pub publication: PublicationSummary,
    pub analysis: AnalysisSummary,
}

impl NotificationPayload {
    pub fn new(publication: &Publication, analysis: &AnalysisResult) -> Self {
        Self {
            timestamp: Utc::now(),
            publication: PublicationSummary {
                title: publication.title.clone(),
                authors: publication.authors.clone(),
                department: publication.department.clone(),
                url: publication.url.clone(),
                publication_date: publication.publication_date.clone(),
            },
            analysis: AnalysisSummary {
                score: analysis.startup_potential_score,
                summary: analysis.summary.clone(),
                key_metrics: analysis.key_metrics.clone(),
                recommendations: analysis.recommendations.clone(),
            },
        }
    }
}
