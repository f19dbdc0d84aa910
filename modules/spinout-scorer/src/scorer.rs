use std::collections::BTreeMap;
use std::sync::Arc;

use ai_client::{AiError, CompletionClient, CompletionRequest};
use chrono::Utc;
use tracing::{info, warn};

use spinout_common::{
    AnalysisResult, Criterion, CriterionScore, Publication, RetryPolicy, StoredPublication,
};

use crate::aggregate::aggregate;
use crate::broad::BroadAnalysis;
use crate::detailed::parse_detailed_scores;
use crate::error::AnalysisError;
use crate::prompts::{
    broad_analysis_prompt, detailed_scoring_prompt, BROAD_ANALYSIS_SYSTEM_PROMPT,
    DETAILED_SCORING_SYSTEM_PROMPT,
};

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Two-stage startup-potential scorer.
///
/// Stage 1 (broad analysis) must succeed or the publication is not scored.
/// Stage 2 (detailed per-criterion scoring) is best effort: a failure leaves
/// the score map empty, which aggregates to 0.0.
pub struct Scorer {
    client: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    temperature: f32,
}

impl Scorer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Score a stored publication, tagging the result with its id.
    pub async fn analyze_stored(
        &self,
        stored: &StoredPublication,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut result = self.analyze(&stored.publication).await?;
        result.publication_id = Some(stored.id);
        Ok(result)
    }

    pub async fn analyze(&self, publication: &Publication) -> Result<AnalysisResult, AnalysisError> {
        let broad = self.broad_analysis(publication).await?;
        let scores = self.detailed_scoring(publication, &broad).await;

        let missing_criteria: Vec<Criterion> = Criterion::ALL
            .into_iter()
            .filter(|c| !scores.contains_key(c))
            .collect();
        if !missing_criteria.is_empty() {
            warn!(
                title = %publication.title,
                missing = ?missing_criteria,
                "Detailed scoring incomplete, missing criteria count as zero"
            );
        }

        let score = aggregate(&scores);
        info!(title = %publication.title, score, "Analyzed publication");

        Ok(AnalysisResult {
            publication_id: None,
            analyzed_at: Utc::now(),
            startup_potential_score: score,
            key_metrics: broad.key_metrics(),
            recommendations: broad.recommendations(),
            summary: broad.summary,
            scores,
            missing_criteria,
            market_analysis: broad.market_analysis,
            technical_assessment: broad.technical_assessment,
            commercialization_strategy: broad.recommended_path,
            key_challenges: broad.key_challenges,
            target_industries: broad.target_industries,
            required_resources: broad.required_resources,
        })
    }

    async fn complete(&self, operation: &str, request: &CompletionRequest) -> Result<String, AiError> {
        self.retry
            .run(operation, AiError::is_retryable, || self.client.complete(request))
            .await
    }

    async fn broad_analysis(&self, publication: &Publication) -> Result<BroadAnalysis, AnalysisError> {
        let request = CompletionRequest::new(
            BROAD_ANALYSIS_SYSTEM_PROMPT,
            broad_analysis_prompt(publication),
        )
        .json_schema::<BroadAnalysis>()
        .temperature(self.temperature);

        let text = self.complete("broad_analysis", &request).await.map_err(|e| {
            warn!(title = %publication.title, error = %e, "Broad analysis failed");
            e
        })?;

        serde_json::from_str(ai_client::strip_code_blocks(&text)).map_err(|e| {
            warn!(title = %publication.title, error = %e, "Broad analysis reply was not valid");
            AnalysisError::Parse(e)
        })
    }

    async fn detailed_scoring(
        &self,
        publication: &Publication,
        broad: &BroadAnalysis,
    ) -> BTreeMap<Criterion, CriterionScore> {
        let request = CompletionRequest::new(
            DETAILED_SCORING_SYSTEM_PROMPT,
            detailed_scoring_prompt(publication, &broad.summary),
        )
        .json_object()
        .temperature(self.temperature);

        let text = match self.complete("detailed_scoring", &request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(title = %publication.title, error = %e, "Detailed scoring failed");
                return BTreeMap::new();
            }
        };

        match parse_detailed_scores(&text) {
            Ok(scores) => scores,
            Err(e) => {
                warn!(title = %publication.title, error = %e, "Detailed scoring reply was not valid");
                BTreeMap::new()
            }
        }
    }
}
