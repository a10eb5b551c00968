//! Deterministic hashing helpers shared across the cache, retrieval, and rerank
//! orchestrator modules.
//!
//! All functions here are pure and allocation-light; none of them are used for
//! authentication or integrity verification, only for cache keys, dedup, and
//! determinism checks.

use blake3::Hasher;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// # Truncation rationale
///
/// Cache keys, tenant ids, and descriptor hashes only need to be fast to compare
/// and cheap to store; a collision degrades to a cache miss or a descriptor
/// mismatch, never data corruption, so 64 bits of BLAKE3 output is enough.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Hashes a tenant identifier to a stable 64-bit value for use in cache keys and
/// log fields without leaking the raw tenant id.
#[inline]
pub fn hash_tenant_id(tenant_id: &str) -> u64 {
    hash_to_u64(tenant_id.as_bytes())
}

/// Hashes a rerank prompt (the fully-assembled text sent to a provider) for use
/// as the `RerankScores` cache layer identifier.
#[inline]
pub fn hash_prompt(prompt: &str) -> u64 {
    hash_to_u64(prompt.as_bytes())
}

/// Hashes a canonicalized job-description string to the `jdHash` used throughout
/// the rerank request/response contract.
#[inline]
pub fn hash_job_description(job_description: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(b"jd\0");
    hasher.update(job_description.trim().as_bytes());
    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Hashes an ordered set of candidate ids into the `docsetHash` used to detect
/// whether a rerank result can be served from cache for an unchanged candidate
/// set.
///
/// Candidate ids are hashed in the order given — callers must sort them first if
/// order-independence is required (the rerank orchestrator canonicalizes by
/// ascending candidate id before calling this, so that re-ordering the same
/// candidate set on the wire never produces a different hash).
pub fn hash_docset<'a, I>(candidate_ids: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Hasher::new();
    for id in candidate_ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\0");
    }
    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Computes the rerank request descriptor hash combining `jdHash`, `docsetHash`,
/// and the requested limit — the identifier used for the `RerankScores` cache
/// layer lookup (§4.5 stage (a)).
#[inline]
pub fn hash_rerank_descriptor(jd_hash: u64, docset_hash: u64, limit: usize) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(&jd_hash.to_le_bytes());
    hasher.update(&docset_hash.to_le_bytes());
    hasher.update(&(limit as u64).to_le_bytes());
    let hash = hasher.finalize();
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_to_u64_determinism() {
        let data = b"test-tenant-id-12345";
        assert_eq!(hash_to_u64(data), hash_to_u64(data));
    }

    #[test]
    fn test_hash_to_u64_uniqueness() {
        let inputs = [
            b"tenant-001".as_slice(),
            b"tenant-002".as_slice(),
            b"TENANT-001".as_slice(),
        ];
        let hashes: HashSet<_> = inputs.iter().map(|i| hash_to_u64(i)).collect();
        assert_eq!(hashes.len(), inputs.len());
    }

    #[test]
    fn test_hash_tenant_id_consistency() {
        let tenant = "acme-corp-production";
        assert_eq!(hash_tenant_id(tenant), hash_tenant_id(tenant));
        assert_eq!(hash_tenant_id(tenant), hash_to_u64(tenant.as_bytes()));
    }

    #[test]
    fn test_hash_prompt_sensitivity() {
        let a = hash_prompt("rank these candidates for a staff engineer role");
        let b = hash_prompt("rank these candidates for a senior engineer role");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_job_description_trims_whitespace() {
        let a = hash_job_description("Staff Backend Engineer");
        let b = hash_job_description("  Staff Backend Engineer  ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_docset_order_sensitive_by_default() {
        let ordered = hash_docset(["c1", "c2", "c3"]);
        let reordered = hash_docset(["c3", "c2", "c1"]);
        assert_ne!(
            ordered, reordered,
            "callers must canonicalize ordering before hashing if order independence is required"
        );
    }

    #[test]
    fn test_hash_docset_determinism() {
        let a = hash_docset(["c1", "c2", "c3"]);
        let b = hash_docset(["c1", "c2", "c3"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_docset_empty() {
        let a = hash_docset(Vec::<&str>::new());
        let b = hash_docset(Vec::<&str>::new());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_rerank_descriptor_sensitivity() {
        let base = hash_rerank_descriptor(1, 2, 20);
        assert_ne!(base, hash_rerank_descriptor(2, 2, 20));
        assert_ne!(base, hash_rerank_descriptor(1, 3, 20));
        assert_ne!(base, hash_rerank_descriptor(1, 2, 10));
    }
}
