//! `skb search` and `skb retrieve`.
//!
//! `search` shows the raw store pre-filter (substring over title, content,
//! and tags). `retrieve` runs the full pipeline: query optimization,
//! pre-filter, per-chunk relevance scoring, and ranking. With `--json` the
//! ranked results are printed as the JSON array consumed by script
//! templating.

use anyhow::Result;

use script_kb_core::store::DocumentStore;
use script_kb_core::RetrievalResult;

use crate::config::Config;
use crate::sqlite_store::open_knowledge_base;

const EXCERPT_CHARS: usize = 200;

/// Collapse whitespace and cut to at most `max_chars` characters.
///
/// A shortened excerpt ends after the last `.` or `,` in the window, else
/// at the last space, and gets a `...` suffix.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    let window: Vec<char> = cleaned.chars().take(max_chars).collect();
    let last = |c: char| window.iter().rposition(|&x| x == c).filter(|&i| i > 0);
    let cut = last('.')
        .map(|i| i + 1)
        .or_else(|| last(',').map(|i| i + 1))
        .or_else(|| last(' '))
        .unwrap_or(window.len());

    let head: String = window[..cut].iter().collect();
    format!("{}...", head.trim())
}

pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let docs = kb.store().search(query).await?;
    kb.store().close().await;

    if docs.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, doc) in docs.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, doc.doc_type, doc.title);
        println!("    added: {}", doc.timestamp.format("%Y-%m-%d"));
        if !doc.tags.is_empty() {
            println!("    tags: {}", doc.tags.join(", "));
        }
        println!("    excerpt: \"{}\"", excerpt(&doc.content, EXCERPT_CHARS));
        println!("    id: {}", doc.id);
        println!();
    }
    Ok(())
}

pub async fn run_retrieve(
    config: &Config,
    query: &str,
    max_items: Option<usize>,
    json: bool,
) -> Result<()> {
    let max_items = max_items.unwrap_or(config.retrieval.max_items);

    let kb = open_knowledge_base(config).await?;
    let results = kb.retrieve_knowledge(query, max_items).await;
    kb.store().close().await;
    let results = results?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

fn print_results(results: &[RetrievalResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.1}] {}", i + 1, result.relevance, result.title);
        let shown = result
            .most_relevant_chunk
            .as_deref()
            .unwrap_or(&result.content);
        println!("    excerpt: \"{}\"", excerpt(shown, EXCERPT_CHARS));
        println!("    id: {}", result.id);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_collapses_whitespace() {
        assert_eq!(excerpt("  a \n\n b\tc  ", 200), "a b c");
    }

    #[test]
    fn test_excerpt_truncates_by_chars() {
        assert_eq!(excerpt("区块链技术", 3), "区块链...");
        assert_eq!(excerpt("区块链", 3), "区块链");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn test_excerpt_prefers_punctuation_then_space() {
        assert_eq!(excerpt("hello world again", 12), "hello world...");
        assert_eq!(excerpt("one, two three four", 12), "one,...");
        assert_eq!(excerpt("a.b c d e f g", 8), "a....");
    }
}
