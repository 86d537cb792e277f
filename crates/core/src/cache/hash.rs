//! Cache key derivation for search terms.

use sha2::{Digest, Sha256};

/// Canonical form of a search term: trimmed and lower-cased.
pub fn normalize_search_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Compute the artwork cache key for a search term.
///
/// Terms that differ only in case or surrounding whitespace share a key.
pub fn compute_cache_key(term: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_search_term(term).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("Pink Floyd Money");
        let hash2 = compute_cache_key("Pink Floyd Money");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_ignores_case_and_padding() {
        assert_eq!(compute_cache_key("  Pink Floyd Money "), compute_cache_key("pink floyd money"));
    }

    #[test]
    fn test_hash_different_terms() {
        assert_ne!(compute_cache_key("money"), compute_cache_key("time"));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("Breathe");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
