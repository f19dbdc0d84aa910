use spinout_common::{Criterion, Publication};

pub const BROAD_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert in analyzing academic research for commercial viability and startup potential.
Analyze the given publication data and provide a detailed assessment of its commercial potential.
Focus on concrete applications, market opportunities, and implementation feasibility.
Be critical and realistic in your assessment.

Return your analysis in JSON format with numerical scores (0-100) for:
- innovation_score: novelty and uniqueness of the solution
- market_potential: size and accessibility of target market
- technical_feasibility: technical complexity and implementation challenges
- implementation_readiness: current stage of development
- competitive_advantage: strength compared to existing solutions

Also include:
- summary: Brief overview of commercial potential
- innovation_analysis: Detailed assessment of the innovation
- market_analysis: Market opportunity assessment
- technical_assessment: Technical feasibility evaluation
- recommended_path: Suggested commercialization approach
- key_challenges: List of main obstacles
- target_industries: List of relevant industries
- time_to_market_months: Estimated months to market
- required_resources: List of needed resources
- required_investment: "low", "medium", or "high"
- risk_level: "low", "medium", or "high"
- recommended_next_steps: List of concrete next steps
- potential_partners: List of potential industry or research partners
- funding_sources: List of suitable funding sources"#;

pub const DETAILED_SCORING_SYSTEM_PROMPT: &str = r#"You are an expert in evaluating research commercialization potential.
For each criterion, provide:
1. A score from 0-100
2. A detailed explanation of the score
3. Specific evidence from the publication
4. Potential risks and opportunities

Format your response as a JSON object keyed by criterion name, each containing:
- score: numerical score
- explanation: detailed reasoning
- evidence: list of supporting evidence
- risks: list of potential risks
- opportunities: list of potential opportunities"#;

/// Abstracts longer than this (in bytes) are cut before prompting.
const MAX_ABSTRACT_BYTES: usize = 12_000;

fn abstract_for_prompt(publication: &Publication) -> &str {
    ai_client::truncate_to_char_boundary(&publication.abstract_text, MAX_ABSTRACT_BYTES)
}

/// Stage 1 user prompt. Only title, abstract, department and type are sent.
pub fn broad_analysis_prompt(publication: &Publication) -> String {
    format!(
        r#"Analyze this research publication for its commercial and startup potential:

Title: {title}

Abstract:
{abstract_text}

Department: {department}
Publication Type: {publication_type}

Consider:
1. What unique problem does this research solve?
2. Is there a clear market need for this solution?
3. How technically feasible is implementation?
4. What resources would be needed for commercialization?
5. What are the main technical and market risks?
6. How does this compare to existing solutions?
7. What is the potential market size and accessibility?
8. How long would it take to bring this to market?

Provide a comprehensive analysis focusing on practical commercial applications."#,
        title = publication.title,
        abstract_text = abstract_for_prompt(publication),
        department = publication.department,
        publication_type = publication.publication_type,
    )
}

fn criteria_descriptions() -> String {
    Criterion::ALL
        .iter()
        .map(|criterion| {
            let subs: Vec<String> = criterion
                .subcriteria()
                .iter()
                .map(|(name, desc)| format!("- {name}: {desc}"))
                .collect();
            format!("{criterion}:\n{}", subs.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stage 2 user prompt, seeded with the Stage 1 summary.
pub fn detailed_scoring_prompt(publication: &Publication, broad_summary: &str) -> String {
    format!(
        r#"Provide a detailed scoring analysis for this publication:

Title: {title}
Abstract: {abstract_text}

Initial Analysis Summary:
{broad_summary}

Please evaluate each criterion:

{criteria}

For each criterion:
1. Assign a score (0-100)
2. Explain your reasoning
3. Cite specific evidence from the publication
4. Identify risks and opportunities

Focus on concrete, practical aspects of commercialization potential."#,
        title = publication.title,
        abstract_text = abstract_for_prompt(publication),
        criteria = criteria_descriptions(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication() -> Publication {
        let mut p = Publication::new("Quantum Sensors", vec!["A. Author".into()])
            .with_abstract("A new sensor design.");
        p.department = "Physics".into();
        p.publication_type = "Article".into();
        p.url = "https://portal.example/p/1".into();
        p
    }

    #[test]
    fn broad_prompt_carries_only_sanitized_fields() {
        let prompt = broad_analysis_prompt(&publication());
        assert!(prompt.contains("Title: Quantum Sensors"));
        assert!(prompt.contains("A new sensor design."));
        assert!(prompt.contains("Department: Physics"));
        assert!(prompt.contains("Publication Type: Article"));
        assert!(prompt.contains("8. How long would it take"));
        assert!(!prompt.contains("A. Author"));
        assert!(!prompt.contains("portal.example"));
    }

    #[test]
    fn detailed_prompt_lists_every_subcriterion() {
        let prompt = detailed_scoring_prompt(&publication(), "Promising sensor.");
        assert!(prompt.contains("Initial Analysis Summary:\nPromising sensor."));
        for criterion in Criterion::ALL {
            assert!(prompt.contains(&format!("{criterion}:\n")));
            for (name, desc) in criterion.subcriteria() {
                assert!(prompt.contains(&format!("- {name}: {desc}")));
            }
        }
    }
}
