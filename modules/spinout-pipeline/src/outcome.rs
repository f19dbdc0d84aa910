use std::fmt::Display;

use serde::Serialize;

use crate::stats::RunStats;

/// Status code plus message, as reported by the trigger surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerOutcome {
    pub status_code: u16,
    pub message: String,
}

impl TriggerOutcome {
    pub fn from_stats(stats: &RunStats) -> Self {
        if stats.cancelled {
            Self {
                status_code: 503,
                message: format!("Run cancelled: {}", stats.summary()),
            }
        } else {
            Self {
                status_code: 200,
                message: format!("Publications processed successfully: {}", stats.summary()),
            }
        }
    }

    pub fn startup_error(error: impl Display) -> Self {
        Self {
            status_code: 500,
            message: format!("Error processing publications: {error}"),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_run_is_200() {
        let stats = RunStats {
            fetched: 3,
            processed: 3,
            ..Default::default()
        };
        let outcome = TriggerOutcome::from_stats(&stats);
        assert_eq!(outcome.status_code, 200);
        assert!(!outcome.is_error());
        assert!(outcome.message.contains("processed 3"));
    }

    #[test]
    fn completed_run_with_item_failures_is_still_200() {
        let stats = RunStats {
            analysis_failures: 2,
            ..Default::default()
        };
        assert_eq!(TriggerOutcome::from_stats(&stats).status_code, 200);
    }

    #[test]
    fn cancelled_run_is_503() {
        let stats = RunStats {
            cancelled: true,
            ..Default::default()
        };
        let outcome = TriggerOutcome::from_stats(&stats);
        assert_eq!(outcome.status_code, 503);
        assert!(outcome.is_error());
    }

    #[test]
    fn startup_error_is_500_and_serializes() {
        let outcome = TriggerOutcome::startup_error("OPENAI_API_KEY environment variable is required");
        assert_eq!(outcome.status_code, 500);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status_code"], 500);
        assert!(json["message"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }
}
