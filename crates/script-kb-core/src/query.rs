//! Pre-retrieval query optimization.
//!
//! Reduces a free-form question to the keywords that matter for lexical
//! matching:
//!
//! 1. Trim and collapse whitespace runs to a single space.
//! 2. Strip leading interrogative openers (`请问`, `什么是`, …).
//! 3. Split on whitespace/punctuation, drop one-character tokens and
//!    stopwords.
//! 4. Join the surviving keywords with spaces, or fall back to the text
//!    from step 2 when nothing survives.
//! 5. Repeat steps 2 to 4 on the joined keywords until they stop changing,
//!    so the output is always a fixed point.

use std::sync::LazyLock;

use regex::Regex;

/// Question openers stripped from the start of a query, in match order.
pub const QUESTION_PREFIXES: &[&str] = &[
    "请解释",
    "请说明",
    "什么是",
    "能否解释",
    "如何理解",
    "怎么理解",
    "请教",
    "请问",
];

/// Function words that never count as keywords.
pub const STOPWORDS: &[&str] = &[
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
    "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这",
];

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static KEYWORD_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s，,。！？.!?]+").expect("valid keyword split regex"));

/// Optimize a raw query for retrieval.
///
/// Deterministic and total; an empty query is returned unchanged.
///
/// ```rust
/// use script_kb_core::query::optimize_query;
///
/// assert_eq!(optimize_query("请问  什么是   区块链"), "区块链");
/// assert_eq!(optimize_query("  rust   ownership model "), "rust ownership model");
/// ```
pub fn optimize_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let normalized = WHITESPACE_RE.replace_all(query.trim(), " ");
    let mut current = strip_question_prefixes(&normalized).to_string();

    // Dropping stopwords can expose a new leading opener, and stripping it
    // can expose a new stopword. Repeat until the keyword form is stable.
    loop {
        let keywords = extract_core_keywords(&current);
        if keywords.is_empty() {
            return current;
        }
        let joined = keywords.join(" ");
        let next = strip_question_prefixes(&joined);
        if next == current {
            return current;
        }
        current = next.to_string();
    }
}

/// Remove leading question openers.
///
/// Each pass strips the first prefix in [`QUESTION_PREFIXES`] order that
/// matches, then trims. Passes repeat until no prefix matches, so stacked
/// openers such as `请问 什么是` are both removed.
pub fn strip_question_prefixes(text: &str) -> &str {
    let mut rest = text;
    while let Some(prefix) = QUESTION_PREFIXES.iter().find(|p| rest.starts_with(**p)) {
        rest = rest[prefix.len()..].trim();
    }
    rest
}

/// Tokens longer than one character that are not stopwords.
pub fn extract_core_keywords(text: &str) -> Vec<&str> {
    KEYWORD_SPLIT_RE
        .split(text)
        .filter(|word| word.chars().count() > 1)
        .filter(|word| !STOPWORDS.contains(word))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_unchanged() {
        assert_eq!(optimize_query(""), "");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(optimize_query("   \t "), "");
    }

    #[test]
    fn test_stacked_prefixes() {
        assert_eq!(optimize_query("请问  什么是   区块链"), "区块链");
    }

    #[test]
    fn test_prefix_order_first_match_wins() {
        // "能否解释" is listed before "请教"; only one of them can match here.
        assert_eq!(strip_question_prefixes("能否解释一下递归"), "一下递归");
        assert_eq!(strip_question_prefixes("请教 分块策略"), "分块策略");
    }

    #[test]
    fn test_prefix_only_at_start() {
        assert_eq!(strip_question_prefixes("区块链是什么是"), "区块链是什么是");
    }

    #[test]
    fn test_stopwords_and_short_tokens_removed() {
        assert_eq!(optimize_query("我 的 区块链 和 比特币"), "区块链 比特币");
        assert_eq!(optimize_query("a rust b"), "rust");
    }

    #[test]
    fn test_punctuation_splits_keywords() {
        assert_eq!(optimize_query("分块，检索。排序!"), "分块 检索 排序");
    }

    #[test]
    fn test_falls_back_when_no_keywords() {
        // Every token is a stopword or a single character.
        assert_eq!(optimize_query("我 的 a"), "我 的 a");
        assert_eq!(optimize_query("请问 你"), "你");
    }

    #[test]
    fn test_idempotent_on_keyword_form() {
        for q in [
            "区块链  技术 的 发展",
            "rust chunking, retrieval",
            "x",
            "多轮 对话 脚本",
            "我 的 a",
        ] {
            let once = optimize_query(q);
            assert_eq!(optimize_query(&once), once, "not a fixed point: {:?}", q);
        }
    }

    #[test]
    fn test_opener_exposed_by_dropped_stopword() {
        assert_eq!(optimize_query("我 什么是区块链"), "区块链");
        assert_eq!(optimize_query("a 请问区块链"), "区块链");
        assert_eq!(optimize_query("的 请问 什么是我 分块"), "分块");
        assert_eq!(optimize_query("a 请问你"), "你");
    }

    #[test]
    fn test_idempotent_when_stopwords_hide_openers() {
        for q in [
            "我 什么是区块链",
            "a 请问区块链",
            "的 请问 什么是我 分块",
            "a 请问你",
            "x 请解释，递归 分块",
        ] {
            let once = optimize_query(q);
            assert_eq!(optimize_query(&once), once, "not a fixed point: {:?}", q);
        }
    }

    #[test]
    fn test_keywords_helper() {
        assert_eq!(
            extract_core_keywords("知识库 检索 的 优化"),
            vec!["知识库", "检索", "优化"]
        );
        assert!(extract_core_keywords("").is_empty());
    }
}
