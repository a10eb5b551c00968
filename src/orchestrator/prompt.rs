//! Prompt assembly and reason synthesis (§4.5 stages (c) and (g)).

use crate::constants::{DEFAULT_MAX_HIGHLIGHTS, DEFAULT_MAX_PROMPT_CHARACTERS, DEFAULT_MAX_SKILLS, DEFAULT_REASON_LIMIT};
use crate::rerank::RerankCandidate;

use super::model::RerankCandidateInput;

/// Truncates `text` to at most `max_chars` characters, respecting UTF-8
/// boundaries.
pub fn trim_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// Builds the bounded candidate content sent to a rerank provider:
/// `summary \n Highlights: ... \n Title|Location|YoE|Skills|MatchReasons: ...`
/// (§4.5 "Limits and inputs").
pub fn build_candidate_content(
    input: &RerankCandidateInput,
    max_highlights: usize,
    max_skills: usize,
) -> String {
    let summary = input.summary.as_deref().unwrap_or("");

    let highlights: Vec<&str> = input.highlights.iter().take(max_highlights).map(String::as_str).collect();
    let highlights_line = format!("Highlights: {}", highlights.join("; "));

    let title = input.features.current_title.as_deref().unwrap_or("");
    let location = input.features.location.as_deref().unwrap_or("");
    let years = input
        .features
        .years_experience
        .map(|y| y.to_string())
        .unwrap_or_default();
    let skills: Vec<&str> = input.features.skills.iter().take(max_skills).map(String::as_str).collect();
    let match_reasons = input.features.match_reasons.join("; ");

    let detail_line =
        format!("{title}|{location}|{years}|{}|{match_reasons}", skills.join(","));

    format!("{summary}\n{highlights_line}\n{detail_line}")
}

/// Assembles the full prompt input: a trimmed job description plus the
/// bounded candidate list (§4.5 stage (c)).
pub fn build_prompt(
    job_description: &str,
    candidates: &[RerankCandidateInput],
    max_prompt_characters: usize,
    max_highlights: usize,
    max_skills: usize,
) -> (String, Vec<RerankCandidate>) {
    let trimmed_jd = trim_to_chars(job_description, max_prompt_characters);

    let rerank_candidates = candidates
        .iter()
        .map(|candidate| RerankCandidate {
            candidate_id: candidate.candidate_id.clone(),
            content: build_candidate_content(candidate, max_highlights, max_skills),
        })
        .collect();

    (trimmed_jd, rerank_candidates)
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_prompt_characters: DEFAULT_MAX_PROMPT_CHARACTERS,
            max_highlights: DEFAULT_MAX_HIGHLIGHTS,
            max_skills: DEFAULT_MAX_SKILLS,
            reason_limit: DEFAULT_REASON_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PromptLimits {
    pub max_prompt_characters: usize,
    pub max_highlights: usize,
    pub max_skills: usize,
    pub reason_limit: usize,
}

/// Synthesizes up to `reason_limit` reasons for a passthrough-ranked or
/// fabricated-slot candidate, from whatever features are available
/// (§4.5 stage (g): "synthesize ≤ reasonLimit reasons from features").
pub fn synthesize_reasons(input: &RerankCandidateInput, reason_limit: usize) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(score) = input.initial_score {
        reasons.push(format!("initial relevance score {score:.2}"));
    }
    for reason in &input.features.match_reasons {
        if reasons.len() >= reason_limit {
            break;
        }
        reasons.push(reason.clone());
    }
    if reasons.len() < reason_limit {
        if let Some(title) = &input.features.current_title {
            reasons.push(format!("current title: {title}"));
        }
    }
    if reasons.len() < reason_limit && !input.features.skills.is_empty() {
        reasons.push(format!("skills: {}", input.features.skills.join(", ")));
    }

    reasons.truncate(reason_limit);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::model::CandidateFeatures;

    fn candidate(id: &str) -> RerankCandidateInput {
        RerankCandidateInput {
            candidate_id: id.to_string(),
            summary: Some("Experienced backend engineer".to_string()),
            highlights: vec!["Led migration".to_string(), "Owned on-call".to_string()],
            initial_score: Some(0.8),
            features: CandidateFeatures {
                current_title: Some("Staff Engineer".to_string()),
                location: Some("Remote".to_string()),
                years_experience: Some(8.0),
                skills: vec!["Rust".to_string(), "Postgres".to_string()],
                match_reasons: vec!["Matches distributed systems keyword".to_string()],
                ..Default::default()
            },
            payload: None,
        }
    }

    #[test]
    fn test_trim_to_chars_respects_utf8_boundary() {
        let text = "héllo wörld";
        let trimmed = trim_to_chars(text, 5);
        assert_eq!(trimmed.chars().count(), 5);
    }

    #[test]
    fn test_build_candidate_content_includes_all_fields() {
        let content = build_candidate_content(&candidate("c1"), 5, 5);
        assert!(content.contains("Staff Engineer"));
        assert!(content.contains("Remote"));
        assert!(content.contains("Rust"));
    }

    #[test]
    fn test_build_prompt_trims_jd() {
        let long_jd = "x".repeat(100);
        let (trimmed, candidates) = build_prompt(&long_jd, &[candidate("c1")], 10, 5, 5);
        assert_eq!(trimmed.len(), 10);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_synthesize_reasons_respects_limit() {
        let reasons = synthesize_reasons(&candidate("c1"), 2);
        assert_eq!(reasons.len(), 2);
    }
}
