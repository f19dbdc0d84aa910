use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Publication
// ---------------------------------------------------------------------------

/// A publication as scraped from the portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    /// ISO `YYYY-MM-DD` when the scraped date was parseable, else the raw text.
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub publication_type: String,
}

impl Publication {
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
            ..Default::default()
        }
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = doi.into();
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = abstract_text.into();
        self
    }

    /// Title and at least one author are required.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.authors.iter().any(|a| !a.trim().is_empty())
    }

    /// The DOI, if one was scraped.
    pub fn doi(&self) -> Option<&str> {
        let doi = self.doi.trim();
        (!doi.is_empty()).then_some(doi)
    }

    /// True when the two author lists share at least one exact name.
    pub fn shares_author_with(&self, other: &[String]) -> bool {
        authors_overlap(&self.authors, other)
    }
}

/// Exact-name author set intersection. No identity disambiguation: two
/// different people with the same name string count as a shared author.
pub fn authors_overlap(a: &[String], b: &[String]) -> bool {
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    b.iter().any(|name| left.contains(name.as_str()))
}

/// A publication persisted by the dedup store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPublication {
    pub id: Uuid,
    #[serde(flatten)]
    pub publication: Publication,
    pub processed: bool,
    pub scraped_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl StoredPublication {
    pub fn new(publication: Publication, scraped_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            publication,
            processed: false,
            scraped_at,
            processed_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// The five weighted evaluation dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Innovation,
    MarketPotential,
    TechnicalFeasibility,
    CompetitiveAdvantage,
    CommercializationReadiness,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Innovation,
        Criterion::MarketPotential,
        Criterion::TechnicalFeasibility,
        Criterion::CompetitiveAdvantage,
        Criterion::CommercializationReadiness,
    ];

    /// Weight in whole percent. Integer so the total is exact.
    pub const fn weight_percent(self) -> u32 {
        match self {
            Criterion::Innovation => 25,
            Criterion::MarketPotential => 25,
            Criterion::TechnicalFeasibility => 20,
            Criterion::CompetitiveAdvantage => 15,
            Criterion::CommercializationReadiness => 15,
        }
    }

    pub fn weight(self) -> f64 {
        f64::from(self.weight_percent()) / 100.0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Innovation => "innovation",
            Criterion::MarketPotential => "market_potential",
            Criterion::TechnicalFeasibility => "technical_feasibility",
            Criterion::CompetitiveAdvantage => "competitive_advantage",
            Criterion::CommercializationReadiness => "commercialization_readiness",
        }
    }

    /// Lenient key lookup for model output: case, spaces and hyphens are ignored.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL.into_iter().find(|c| c.as_str() == normalized)
    }

    /// Sub-criteria (name, description) listed in the detailed scoring prompt.
    pub fn subcriteria(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Criterion::Innovation => &[
                ("novelty", "Uniqueness of the solution"),
                ("technological_advancement", "Level of technological innovation"),
                ("patent_potential", "Potential for IP protection"),
            ],
            Criterion::MarketPotential => &[
                ("market_size", "Total addressable market size"),
                ("growth_potential", "Market growth trajectory"),
                ("customer_need", "Strength of market demand"),
            ],
            Criterion::TechnicalFeasibility => &[
                ("implementation_complexity", "Ease of implementation"),
                ("scalability", "Ability to scale the solution"),
                ("resource_requirements", "Required resources and infrastructure"),
            ],
            Criterion::CompetitiveAdvantage => &[
                ("differentiation", "Uniqueness compared to competitors"),
                ("barriers_to_entry", "Defensibility of the solution"),
                ("cost_advantage", "Cost-effectiveness of the solution"),
            ],
            Criterion::CommercializationReadiness => &[
                ("development_stage", "Current stage of development"),
                ("time_to_market", "Expected time to commercialization"),
                ("regulatory_requirements", "Regulatory compliance needs"),
            ],
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum of all criterion weights, in percent.
pub const WEIGHT_TOTAL_PERCENT: u32 = {
    let mut total = 0;
    let mut i = 0;
    while i < Criterion::ALL.len() {
        total += Criterion::ALL[i].weight_percent();
        i += 1;
    }
    total
};

const _: () = assert!(
    WEIGHT_TOTAL_PERCENT == 100,
    "criterion weights must sum to 1.00"
);

/// Detailed score for one criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    /// 0-100.
    pub score: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

impl CriterionScore {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    /// Parse a model-provided label. Anything unrecognized is `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" | "minimal" => Level::Low,
            "high" | "very high" | "significant" => Level::High,
            _ => Level::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub time_to_market_months: u32,
    pub investment_level: Level,
    pub risk_level: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub next_steps: Vec<String>,
    pub potential_partners: Vec<String>,
    pub funding_sources: Vec<String>,
}

/// Full result of the two-stage scoring pipeline for one publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub publication_id: Option<Uuid>,
    pub analyzed_at: DateTime<Utc>,
    /// 0.0-10.0, one decimal.
    pub startup_potential_score: f64,
    pub summary: String,
    pub scores: BTreeMap<Criterion, CriterionScore>,
    /// Criteria the detailed scoring stage did not return.
    pub missing_criteria: Vec<Criterion>,
    pub market_analysis: String,
    pub technical_assessment: String,
    pub commercialization_strategy: String,
    pub key_challenges: Vec<String>,
    pub target_industries: Vec<String>,
    pub required_resources: Vec<String>,
    pub key_metrics: KeyMetrics,
    pub recommendations: Recommendations,
}

impl AnalysisResult {
    pub fn is_degraded(&self) -> bool {
        !self.missing_criteria.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn weights_sum_to_exactly_one() {
        assert_eq!(WEIGHT_TOTAL_PERCENT, 100);
        let sum: u32 = Criterion::ALL.iter().map(|c| c.weight_percent()).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn criterion_keys_are_lenient() {
        assert_eq!(Criterion::from_key("innovation"), Some(Criterion::Innovation));
        assert_eq!(
            Criterion::from_key("Market Potential"),
            Some(Criterion::MarketPotential)
        );
        assert_eq!(
            Criterion::from_key("commercialization-readiness"),
            Some(Criterion::CommercializationReadiness)
        );
        assert_eq!(Criterion::from_key("vibes"), None);
    }

    #[test]
    fn criterion_serde_matches_as_str() {
        for c in Criterion::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
    }

    #[test]
    fn every_criterion_has_three_subcriteria() {
        for c in Criterion::ALL {
            assert_eq!(c.subcriteria().len(), 3, "{c}");
        }
    }

    #[test]
    fn level_labels_fall_back_to_medium() {
        assert_eq!(Level::from_label("LOW"), Level::Low);
        assert_eq!(Level::from_label(" high "), Level::High);
        assert_eq!(Level::from_label("moderate"), Level::Medium);
        assert_eq!(Level::from_label(""), Level::Medium);
    }

    #[test]
    fn publication_requires_title_and_author() {
        assert!(Publication::new("X", names(&["A"])).is_valid());
        assert!(!Publication::new("", names(&["A"])).is_valid());
        assert!(!Publication::new("X", vec![]).is_valid());
        assert!(!Publication::new("X", names(&["  "])).is_valid());
    }

    #[test]
    fn blank_doi_is_absent() {
        assert_eq!(Publication::new("X", vec![]).doi(), None);
        assert_eq!(Publication::new("X", vec![]).with_doi("  ").doi(), None);
        assert_eq!(
            Publication::new("X", vec![]).with_doi(" 10.1000/xyz ").doi(),
            Some("10.1000/xyz")
        );
    }

    #[test]
    fn author_overlap_is_exact_match() {
        assert!(authors_overlap(&names(&["A", "B"]), &names(&["C", "B"])));
        assert!(!authors_overlap(&names(&["A", "B"]), &names(&["C", "D"])));
        assert!(!authors_overlap(&names(&["A"]), &names(&["a"])));
        assert!(!authors_overlap(&[], &names(&["A"])));
    }

    #[test]
    fn abstract_field_uses_wire_name() {
        let publication = Publication::new("X", names(&["A"])).with_abstract("Sensors");
        let json = serde_json::to_value(&publication).unwrap();
        assert_eq!(json["abstract"], "Sensors");

        let back: Publication =
            serde_json::from_value(serde_json::json!({"title": "X", "authors": ["A"]})).unwrap();
        assert!(back.abstract_text.is_empty());
    }

    #[test]
    fn stored_publication_starts_unprocessed() {
        let stored = StoredPublication::new(Publication::new("X", names(&["A"])), Utc::now());
        assert!(!stored.processed);
        assert!(stored.processed_at.is_none());
    }
}
