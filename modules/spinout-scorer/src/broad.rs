use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use spinout_common::{KeyMetrics, Level, Recommendations};

/// What the model returns for the Stage 1 broad analysis.
///
/// The five 0-100 sub-scores are required. Everything else is defaulted so a
/// terse reply still parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BroadAnalysis {
    /// Novelty and uniqueness of the solution (0-100)
    pub innovation_score: f64,
    /// Size and accessibility of the target market (0-100)
    pub market_potential: f64,
    /// Technical complexity and implementation challenges (0-100)
    pub technical_feasibility: f64,
    /// Current stage of development (0-100)
    pub implementation_readiness: f64,
    /// Strength compared to existing solutions (0-100)
    pub competitive_advantage: f64,

    /// Brief overview of commercial potential
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub innovation_analysis: String,
    #[serde(default)]
    pub market_analysis: String,
    #[serde(default)]
    pub technical_assessment: String,
    /// Suggested commercialization approach
    #[serde(default)]
    pub recommended_path: String,
    #[serde(default)]
    pub key_challenges: Vec<String>,
    #[serde(default)]
    pub target_industries: Vec<String>,
    /// Estimated months to market
    #[serde(default)]
    pub time_to_market_months: f64,
    #[serde(default)]
    pub required_resources: Vec<String>,
    /// "low", "medium", or "high"
    #[serde(default)]
    pub required_investment: String,
    /// "low", "medium", or "high"
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub recommended_next_steps: Vec<String>,
    #[serde(default)]
    pub potential_partners: Vec<String>,
    #[serde(default)]
    pub funding_sources: Vec<String>,
}

impl BroadAnalysis {
    pub fn key_metrics(&self) -> KeyMetrics {
        let months = if self.time_to_market_months.is_finite() {
            self.time_to_market_months.max(0.0).round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        KeyMetrics {
            time_to_market_months: months,
            investment_level: Level::from_label(&self.required_investment),
            risk_level: Level::from_label(&self.risk_level),
        }
    }

    pub fn recommendations(&self) -> Recommendations {
        Recommendations {
            next_steps: self.recommended_next_steps.clone(),
            potential_partners: self.potential_partners.clone(),
            funding_sources: self.funding_sources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::StructuredOutput;

    #[test]
    fn minimal_reply_parses_with_defaults() {
        let json = r#"{
            "innovation_score": 80,
            "market_potential": 70,
            "technical_feasibility": 60,
            "implementation_readiness": 50,
            "competitive_advantage": 40
        }"#;
        let broad: BroadAnalysis = serde_json::from_str(json).unwrap();

        assert_eq!(broad.innovation_score, 80.0);
        assert!(broad.summary.is_empty());
        let metrics = broad.key_metrics();
        assert_eq!(metrics.time_to_market_months, 0);
        assert_eq!(metrics.investment_level, Level::Medium);
        assert_eq!(metrics.risk_level, Level::Medium);
    }

    #[test]
    fn missing_sub_score_is_a_parse_error() {
        let json = r#"{"innovation_score": 80, "summary": "x"}"#;
        assert!(serde_json::from_str::<BroadAnalysis>(json).is_err());
    }

    #[test]
    fn key_metrics_normalize_model_values() {
        let broad = BroadAnalysis {
            time_to_market_months: 17.6,
            required_investment: "High".into(),
            risk_level: "low".into(),
            ..Default::default()
        };
        let metrics = broad.key_metrics();
        assert_eq!(metrics.time_to_market_months, 18);
        assert_eq!(metrics.investment_level, Level::High);
        assert_eq!(metrics.risk_level, Level::Low);

        let negative = BroadAnalysis {
            time_to_market_months: -5.0,
            ..Default::default()
        };
        assert_eq!(negative.key_metrics().time_to_market_months, 0);
    }

    #[test]
    fn schema_requires_every_field() {
        let schema = BroadAnalysis::openai_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "funding_sources"));
        assert!(required.iter().any(|v| v == "innovation_score"));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn schema_has_no_strict_mode_rejects() {
        let text = BroadAnalysis::openai_schema().to_string();
        assert!(!text.contains("\"default\""), "{text}");
        assert!(!text.contains("\"format\""), "{text}");
    }

    #[test]
    fn default_model_accepts_the_broad_analysis_schema() {
        let model = spinout_common::config::DEFAULT_MODEL;
        assert!(ai_client::supports_structured_output(model), "{model}");

        let config = spinout_common::Config::from_lookup(|key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        assert!(ai_client::supports_structured_output(&config.openai_model));
    }
}
