use ai_client::AiError;

/// Stage 1 failed, so the publication has no score.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Broad analysis request failed: {0}")]
    Completion(#[from] AiError),

    #[error("Broad analysis response could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}
