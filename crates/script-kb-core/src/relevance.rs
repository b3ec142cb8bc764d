//! Lexical relevance scoring.
//!
//! The score is the percentage of query terms that occur in the candidate
//! text. Matching is case-insensitive substring containment, not
//! whole-word matching: a short term also matches inside longer words.

/// Percentage in `[0, 100]` of whitespace-separated `query` terms that
/// occur in `content`.
///
/// A query without terms scores 0.
///
/// ```rust
/// use script_kb_core::relevance::calculate_relevance;
///
/// assert_eq!(calculate_relevance("rust chunk", "Rust chunking guide"), 100.0);
/// assert_eq!(calculate_relevance("rust python", "rust only"), 50.0);
/// assert_eq!(calculate_relevance("", "anything"), 0.0);
/// ```
pub fn calculate_relevance(query: &str, content: &str) -> f64 {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    if terms.is_empty() {
        return 0.0;
    }

    let content_lower = content.to_lowercase();
    let matches = terms
        .iter()
        .filter(|term| content_lower.contains(**term))
        .count();

    matches as f64 / terms.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_terms() {
        assert_eq!(calculate_relevance("", "anything"), 0.0);
        assert_eq!(calculate_relevance("   ", "anything"), 0.0);
    }

    #[test]
    fn test_all_terms_present() {
        assert_eq!(calculate_relevance("区块链 共识", "区块链依赖共识算法"), 100.0);
    }

    #[test]
    fn test_partial_match() {
        let score = calculate_relevance("alpha beta gamma", "only alpha here");
        assert!((score - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(calculate_relevance("RUST", "rust"), 100.0);
        assert_eq!(calculate_relevance("rust", "RUST"), 100.0);
    }

    #[test]
    fn test_substring_not_whole_word() {
        assert_eq!(calculate_relevance("cat", "concatenate"), 100.0);
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(calculate_relevance("term", ""), 0.0);
    }

    #[test]
    fn test_bounds() {
        let cases = [
            ("a b c", "abc"),
            ("x", ""),
            ("重复 重复", "重复"),
            ("one two", "three"),
        ];
        for (q, c) in cases {
            let s = calculate_relevance(q, c);
            assert!((0.0..=100.0).contains(&s), "{} out of range for {:?}", s, (q, c));
        }
    }
}
