//! Length- and format-based selection of a chunking strategy.
//!
//! [`smart_chunking`] picks a strategy from the declared content type and
//! the document length:
//!
//! | Condition | Strategy |
//! |-----------|----------|
//! | content type is markdown | headings |
//! | length > 2000 | recursive (defaults) |
//! | 500 < length ≤ 2000 | sentence count (defaults) |
//! | length ≤ 500 | fixed size, 300 chars, 30 overlap |
//!
//! The thresholds and per-strategy options live in an explicit
//! [`ChunkingPolicy`] value; [`ChunkingPolicy::default`] reproduces the
//! table above.

use serde::{Deserialize, Serialize};

use crate::chunk::{
    chunk_by_fixed_size, chunk_by_markdown, chunk_by_sentences, chunk_recursively,
    FixedSizeOptions, RecursiveOptions, SentenceOptions,
};
use crate::models::ContentType;

/// Thresholds and per-strategy options used by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingPolicy {
    /// Content longer than this is chunked recursively.
    pub recursive_threshold: usize,
    /// Content longer than this (and not recursive) is chunked by sentences.
    pub sentence_threshold: usize,
    /// Options for short content.
    pub fixed_size: FixedSizeOptions,
    pub sentence: SentenceOptions,
    pub recursive: RecursiveOptions,
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            recursive_threshold: 2000,
            sentence_threshold: 500,
            fixed_size: FixedSizeOptions {
                chunk_size: 300,
                overlap: 30,
            },
            sentence: SentenceOptions::default(),
            recursive: RecursiveOptions::default(),
        }
    }
}

/// A chunking strategy together with the options it will run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    FixedSize(FixedSizeOptions),
    Sentences(SentenceOptions),
    Recursive(RecursiveOptions),
    Markdown,
}

impl ChunkStrategy {
    /// Run this strategy over `content`.
    pub fn apply(&self, content: &str) -> Vec<String> {
        match self {
            ChunkStrategy::FixedSize(opts) => chunk_by_fixed_size(content, opts),
            ChunkStrategy::Sentences(opts) => chunk_by_sentences(content, opts),
            ChunkStrategy::Recursive(opts) => chunk_recursively(content, opts),
            ChunkStrategy::Markdown => chunk_by_markdown(content),
        }
    }

    /// Short lowercase name, used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            ChunkStrategy::FixedSize(_) => "fixed",
            ChunkStrategy::Sentences(_) => "sentence",
            ChunkStrategy::Recursive(_) => "recursive",
            ChunkStrategy::Markdown => "markdown",
        }
    }
}

/// Decide which strategy [`smart_chunking_with`] would use.
pub fn select_strategy_with(
    content: &str,
    content_type: ContentType,
    policy: &ChunkingPolicy,
) -> ChunkStrategy {
    if content_type == ContentType::Markdown {
        return ChunkStrategy::Markdown;
    }

    let len = content.chars().count();
    if len > policy.recursive_threshold {
        ChunkStrategy::Recursive(policy.recursive)
    } else if len > policy.sentence_threshold {
        ChunkStrategy::Sentences(policy.sentence)
    } else {
        ChunkStrategy::FixedSize(policy.fixed_size)
    }
}

/// [`select_strategy_with`] under the default policy.
pub fn select_strategy(content: &str, content_type: ContentType) -> ChunkStrategy {
    select_strategy_with(content, content_type, &ChunkingPolicy::default())
}

/// Chunk `content` with the strategy chosen by `policy`.
pub fn smart_chunking_with(
    content: &str,
    content_type: ContentType,
    policy: &ChunkingPolicy,
) -> Vec<String> {
    select_strategy_with(content, content_type, policy).apply(content)
}

/// Chunk `content` with the strategy chosen by the default policy.
pub fn smart_chunking(content: &str, content_type: ContentType) -> Vec<String> {
    smart_chunking_with(content, content_type, &ChunkingPolicy::default())
}

/// Segmentation seam used at ingestion time.
///
/// [`KnowledgeBase`](crate::retrieve::KnowledgeBase) takes a `Chunker` so
/// that tests and alternative front ends can substitute their own
/// segmentation.
pub trait Chunker: Send + Sync {
    fn chunk(&self, content: &str, content_type: ContentType) -> Vec<String>;
}

/// The default [`Chunker`]: dispatches through [`smart_chunking_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartChunker {
    pub policy: ChunkingPolicy,
}

impl SmartChunker {
    pub fn new(policy: ChunkingPolicy) -> Self {
        Self { policy }
    }
}

impl Chunker for SmartChunker {
    fn chunk(&self, content: &str, content_type: ContentType) -> Vec<String> {
        smart_chunking_with(content, content_type, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let at = |n: usize| select_strategy(&"字".repeat(n), ContentType::Text);

        assert!(matches!(at(2001), ChunkStrategy::Recursive(o) if o == RecursiveOptions::default()));
        assert!(matches!(at(2000), ChunkStrategy::Sentences(o) if o == SentenceOptions::default()));
        assert!(matches!(at(501), ChunkStrategy::Sentences(_)));
        assert_eq!(
            at(500),
            ChunkStrategy::FixedSize(FixedSizeOptions {
                chunk_size: 300,
                overlap: 30
            })
        );
        assert!(matches!(at(0), ChunkStrategy::FixedSize(_)));
    }

    #[test]
    fn test_markdown_ignores_length() {
        for n in [10, 800, 5000] {
            let text = format!("# h\n{}", "x".repeat(n));
            assert_eq!(
                select_strategy(&text, ContentType::Markdown),
                ChunkStrategy::Markdown
            );
        }
    }

    #[test]
    fn test_smart_chunking_matches_selected_strategy() {
        let text = "第一句。第二句。第三句。第四句。".repeat(40);
        let strategy = select_strategy(&text, ContentType::Text);
        assert_eq!(strategy.name(), "sentence");
        assert_eq!(smart_chunking(&text, ContentType::Text), strategy.apply(&text));
    }

    #[test]
    fn test_custom_policy() {
        let policy = ChunkingPolicy {
            recursive_threshold: 20,
            sentence_threshold: 10,
            ..ChunkingPolicy::default()
        };
        assert_eq!(
            select_strategy_with(&"a".repeat(21), ContentType::Text, &policy).name(),
            "recursive"
        );
        assert_eq!(
            select_strategy_with(&"a".repeat(11), ContentType::Text, &policy).name(),
            "sentence"
        );
    }

    #[test]
    fn test_smart_chunker_is_total() {
        let chunker = SmartChunker::default();
        assert!(chunker.chunk("", ContentType::Text).is_empty());
        assert!(chunker.chunk("", ContentType::Markdown).is_empty());
        assert_eq!(chunker.chunk("hi", ContentType::Text), vec!["hi"]);
    }
}
