use spinout_common::{AnalysisResult, DEFAULT_SCORE_THRESHOLD};

/// True when the result meets the threshold. Inclusive.
pub fn should_notify(result: &AnalysisResult, threshold: f64) -> bool {
    result.startup_potential_score >= threshold
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationGate {
    threshold: f64,
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_THRESHOLD)
    }
}

impl NotificationGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn should_notify(&self, result: &AnalysisResult) -> bool {
        should_notify(result, self.threshold)
    }
}
