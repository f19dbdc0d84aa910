use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use spinout_common::{Criterion, CriterionScore};

/// Parse the Stage 2 reply into per-criterion scores.
///
/// The reply is a JSON object keyed by criterion name. Keys are matched
/// leniently, unknown keys are ignored, and a criterion whose value has no
/// usable score is treated as absent. A reply wrapped in a single
/// `{"scores": {...}}`-style envelope is unwrapped.
pub fn parse_detailed_scores(
    text: &str,
) -> Result<BTreeMap<Criterion, CriterionScore>, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(ai_client::strip_code_blocks(text))?;

    let mut scores = collect_scores(&root);
    if scores.is_empty() {
        if let Some(inner) = single_envelope(&root) {
            scores = collect_scores(inner);
        }
    }
    Ok(scores)
}

fn collect_scores(map: &Map<String, Value>) -> BTreeMap<Criterion, CriterionScore> {
    let mut scores = BTreeMap::new();
    for (key, value) in map {
        let Some(criterion) = Criterion::from_key(key) else {
            debug!(key, "Ignoring unknown criterion in detailed scoring");
            continue;
        };
        match criterion_score(value) {
            Some(score) => {
                scores.insert(criterion, score);
            }
            None => debug!(%criterion, "Criterion returned without a usable score"),
        }
    }
    scores
}

fn single_envelope(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let mut objects = map.values().filter_map(Value::as_object);
    let only = objects.next()?;
    objects.next().is_none().then_some(only)
}

fn criterion_score(value: &Value) -> Option<CriterionScore> {
    match value {
        Value::Object(obj) => Some(CriterionScore {
            score: number(obj.get("score")?)?,
            explanation: obj
                .get("explanation")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            evidence: string_list(obj.get("evidence")),
            risks: string_list(obj.get("risks")),
            opportunities: string_list(obj.get("opportunities")),
        }),
        other => number(other).map(CriterionScore::new),
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
