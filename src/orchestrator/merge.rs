//! Passthrough ordering and provider-response merge (§4.5 stages (f), (g)).

use std::collections::HashSet;

use tracing::warn;

use crate::rerank::{RerankResponse, RerankResult};

use super::model::RerankCandidateInput;
use super::prompt::synthesize_reasons;

/// Orders `candidates` by descending passthrough score (`vectorScore →
/// textScore → 0`), ties broken by ascending `candidateId` for determinism,
/// and assigns contiguous ranks `1..N`.
pub fn passthrough_results(
    candidates: &[RerankCandidateInput],
    limit: usize,
    include_reasons: bool,
    reason_limit: usize,
) -> Vec<RerankResult> {
    let mut ordered: Vec<&RerankCandidateInput> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        b.passthrough_score()
            .partial_cmp(&a.passthrough_score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });
    ordered.truncate(limit);

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| RerankResult {
            candidate_id: candidate.candidate_id.clone(),
            rank: (index + 1) as u32,
            score: candidate.passthrough_score(),
            reasons: if include_reasons { synthesize_reasons(candidate, reason_limit) } else { Vec::new() },
        })
        .collect()
}

/// Merges a provider's response with the input candidate set: fabricated ids
/// (not present in the input) are dropped with a warning, and any slots left
/// empty after filtering are filled from the passthrough ordering of the
/// remaining candidates, up to `limit`. Ranks are always reassigned
/// contiguously (§4.5 stage (g)).
pub fn merge_provider_response(
    response: RerankResponse,
    candidates: &[RerankCandidateInput],
    limit: usize,
    include_reasons: bool,
    reason_limit: usize,
) -> Vec<RerankResult> {
    let valid_ids: HashSet<&str> = candidates.iter().map(|c| c.candidate_id.as_str()).collect();
    let by_id: std::collections::HashMap<&str, &RerankCandidateInput> =
        candidates.iter().map(|c| (c.candidate_id.as_str(), c)).collect();

    let mut used: HashSet<String> = HashSet::new();
    let mut merged: Vec<RerankResult> = Vec::new();

    for mut result in response.candidates {
        if !valid_ids.contains(result.candidate_id.as_str()) {
            warn!(candidate_id = %result.candidate_id, "dropping fabricated candidate id from provider response");
            continue;
        }
        if used.contains(&result.candidate_id) {
            continue;
        }
        if !include_reasons {
            result.reasons.clear();
        } else if result.reasons.is_empty() {
            if let Some(input) = by_id.get(result.candidate_id.as_str()) {
                result.reasons = synthesize_reasons(input, reason_limit);
            }
        } else {
            result.reasons.truncate(reason_limit);
        }
        used.insert(result.candidate_id.clone());
        merged.push(result);
        if merged.len() >= limit {
            break;
        }
    }

    if merged.len() < limit {
        let remaining: Vec<RerankCandidateInput> =
            candidates.iter().filter(|c| !used.contains(&c.candidate_id)).cloned().collect();
        let fill = passthrough_results(&remaining, limit - merged.len(), include_reasons, reason_limit);
        merged.extend(fill);
    }

    merged
        .into_iter()
        .enumerate()
        .map(|(index, result)| RerankResult { rank: (index + 1) as u32, ..result })
        .collect()
}
