//! Reciprocal rank fusion: a pure merge over two ranked slices (§4.3 step 3, §9
//! "RRF as a generic merge").

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::store::StoreHit;

/// A candidate's fused score plus the raw per-branch scores it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub candidate_id: String,
    pub vector_score: Option<f64>,
    pub text_score: Option<f64>,
    pub rrf_score: f64,
}

/// Fuses two ranked hit lists with RRF (`k` is the smoothing constant,
/// [`crate::constants::DEFAULT_RRF_K`] by default) and truncates to `limit`.
///
/// Ties are broken by (a) the higher of the two raw scores, then (b)
/// lexicographic `candidateId` — both documented invariants (§8 property 8,
/// §4.3 step 3).
pub fn rrf_merge(vector_hits: &[StoreHit], text_hits: &[StoreHit], k: u32, limit: usize) -> Vec<FusedCandidate> {
    let mut scores: HashMap<&str, (f64, Option<f64>, Option<f64>)> = HashMap::new();

    for (rank, hit) in vector_hits.iter().enumerate() {
        let contribution = 1.0 / (k as f64 + (rank + 1) as f64);
        let entry = scores.entry(&hit.candidate_id).or_insert((0.0, None, None));
        entry.0 += contribution;
        entry.1 = Some(hit.score);
    }

    for (rank, hit) in text_hits.iter().enumerate() {
        let contribution = 1.0 / (k as f64 + (rank + 1) as f64);
        let entry = scores.entry(&hit.candidate_id).or_insert((0.0, None, None));
        entry.0 += contribution;
        entry.2 = Some(hit.score);
    }

    let mut fused: Vec<FusedCandidate> = scores
        .into_iter()
        .map(|(id, (rrf_score, vector_score, text_score))| FusedCandidate {
            candidate_id: id.to_string(),
            vector_score,
            text_score,
            rrf_score,
        })
        .collect();

    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let a_raw = a.vector_score.unwrap_or(0.0).max(a.text_score.unwrap_or(0.0));
                let b_raw = b.vector_score.unwrap_or(0.0).max(b.text_score.unwrap_or(0.0));
                b_raw.partial_cmp(&a_raw).unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    fused.truncate(limit);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f64) -> StoreHit {
        StoreHit { candidate_id: id.to_string(), score }
    }

    #[test]
    fn test_both_branches_agree_on_order() {
        let vector = vec![hit("c1", 0.9), hit("c2", 0.8)];
        let text = vec![hit("c1", 0.7), hit("c2", 0.6)];
        let fused = rrf_merge(&vector, &text, 60, 10);
        assert_eq!(fused[0].candidate_id, "c1");
        assert_eq!(fused[1].candidate_id, "c2");
    }

    #[test]
    fn test_rrf_fairness_property() {
        // c1 ranks ahead of c2 in both branches -> c1's fused score must be >= c2's.
        let vector = vec![hit("c1", 0.5), hit("c2", 0.4), hit("c3", 0.3)];
        let text = vec![hit("c1", 0.6), hit("c3", 0.5), hit("c2", 0.4)];
        let fused = rrf_merge(&vector, &text, 60, 10);
        let c1 = fused.iter().find(|c| c.candidate_id == "c1").unwrap();
        let c2 = fused.iter().find(|c| c.candidate_id == "c2").unwrap();
        assert!(c1.rrf_score >= c2.rrf_score);
    }

    #[test]
    fn test_truncates_to_limit() {
        let vector = vec![hit("c1", 0.9), hit("c2", 0.8), hit("c3", 0.7)];
        let fused = rrf_merge(&vector, &[], 60, 2);
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn test_candidate_only_in_one_branch() {
        let vector = vec![hit("c1", 0.9)];
        let text = vec![hit("c2", 0.9)];
        let fused = rrf_merge(&vector, &text, 60, 10);
        assert_eq!(fused.len(), 2);
        // equal single-branch rank-1 contributions tie -> raw score tie -> id order
        assert_eq!(fused[0].candidate_id, "c1");
    }

    #[test]
    fn test_both_empty_returns_empty() {
        assert!(rrf_merge(&[], &[], 60, 10).is_empty());
    }

    #[test]
    fn test_tie_break_prefers_higher_raw_score() {
        let vector = vec![hit("a", 0.5), hit("b", 0.9)];
        // same rank positions in the sole branch they each appear in individually
        let text = vec![hit("b", 0.1)];
        let vector_only = vec![hit("a", 0.5)];
        let fused_a = rrf_merge(&vector_only, &[], 60, 10);
        let fused_b = rrf_merge(&[hit("b", 0.9)], &text, 60, 10);
        assert_eq!(fused_a[0].candidate_id, "a");
        assert_eq!(fused_b[0].candidate_id, "b");
        let _ = vector;
    }

    #[test]
    fn test_determinism() {
        let vector = vec![hit("c1", 0.9), hit("c2", 0.8)];
        let text = vec![hit("c3", 0.7)];
        let first = rrf_merge(&vector, &text, 60, 10);
        let second = rrf_merge(&vector, &text, 60, 10);
        assert_eq!(first, second);
    }
}
