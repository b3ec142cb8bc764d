//! Text chunking strategies.
//!
//! Four interchangeable segmentation algorithms, each producing an ordered
//! sequence of trimmed, non-empty chunks from one document:
//!
//! | Strategy | Function | Defaults |
//! |----------|----------|----------|
//! | Fixed size + overlap | [`chunk_by_fixed_size`] | 300 chars, 50 overlap |
//! | Sentence count | [`chunk_by_sentences`] | 3 sentences |
//! | Depth-bounded recursive | [`chunk_recursively`] | depth 2, base 500 |
//! | Markdown headings | [`chunk_by_markdown`] | — |
//!
//! All sizes and offsets are measured in characters, not bytes. Empty or
//! whitespace-only input yields an empty sequence for every strategy.
//!
//! # Example
//!
//! ```rust
//! use script_kb_core::chunk::{chunk_by_sentences, SentenceOptions};
//!
//! let chunks = chunk_by_sentences("One. Two. Three.", &SentenceOptions { max_sentences: 2 });
//! assert_eq!(chunks, vec!["One. Two.", "Three."]);
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::boundary::find_nearest_punctuation;
use crate::models::ChunkStatistics;

/// A run of non-terminators followed by at most one sentence terminator.
static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^。！？.?!]+[。！？.?!]?").expect("valid sentence regex")
});

/// One or more `#` followed by whitespace at the start of a line.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+\s").expect("valid heading regex"));

/// Settings for [`chunk_by_fixed_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedSizeOptions {
    /// Target chunk length before boundary snapping.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub overlap: usize,
}

impl Default for FixedSizeOptions {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            overlap: 50,
        }
    }
}

/// Settings for [`chunk_by_sentences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentenceOptions {
    pub max_sentences: usize,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self { max_sentences: 3 }
    }
}

/// Settings for [`chunk_recursively`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecursiveOptions {
    /// Recursion stops at this depth.
    pub max_depth: usize,
    /// Content at or below this length is never split.
    pub base_size: usize,
}

impl Default for RecursiveOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            base_size: 500,
        }
    }
}

/// Split `content` into windows of roughly `chunk_size` characters that
/// overlap by `overlap` characters.
///
/// Each window end is pulled back to the closest sentence or clause
/// terminator within the look-back window (see
/// [`find_nearest_punctuation`]), provided that keeps the chunk non-empty.
///
/// # Guarantees
///
/// - Terminates for every input: the window start strictly increases on
///   each iteration, and the loop stops once a chunk reaches the end.
/// - Without a terminator in range, no chunk exceeds `chunk_size`.
/// - A `chunk_size` of zero is treated as one.
pub fn chunk_by_fixed_size(content: &str, options: &FixedSizeOptions) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    let chunk_size = options.chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + chunk_size).min(len);

        let marker = find_nearest_punctuation(&chars, end);
        if marker > start {
            end = marker;
        }

        push_trimmed(&mut chunks, &chars[start..end].iter().collect::<String>());

        if end >= len {
            break;
        }

        // Snapping can leave a chunk shorter than the overlap; never step back.
        let next = end.saturating_sub(options.overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Split `content` into sentences, terminator included.
///
/// A sentence is a run of non-terminators followed by at most one of
/// `。！？.?!`. Content that contains no such run is returned whole.
pub fn split_sentences(content: &str) -> Vec<&str> {
    let sentences: Vec<&str> = SENTENCE_RE.find_iter(content).map(|m| m.as_str()).collect();
    if sentences.is_empty() {
        vec![content]
    } else {
        sentences
    }
}

/// Group consecutive sentences into chunks of `max_sentences` each.
///
/// Sentences are concatenated without an added separator, so the original
/// spacing between them is preserved.
pub fn chunk_by_sentences(content: &str, options: &SentenceOptions) -> Vec<String> {
    let group = options.max_sentences.max(1);
    let mut chunks = Vec::new();
    for sentences in split_sentences(content).chunks(group) {
        push_trimmed(&mut chunks, &sentences.concat());
    }
    chunks
}

/// Divide-and-conquer segmentation for long documents.
///
/// Content at or below `base_size` characters, or reached at `max_depth`,
/// is returned as a single chunk. Otherwise one fixed-size pass runs with a
/// window of `base_size * 2^depth` and an overlap of `base_size / 10`, and
/// each resulting piece is processed again one level deeper.
///
/// Note that the window grows with depth rather than shrinking.
pub fn chunk_recursively(content: &str, options: &RecursiveOptions) -> Vec<String> {
    chunk_recursively_at(content, options, 0)
}

fn chunk_recursively_at(content: &str, options: &RecursiveOptions, depth: usize) -> Vec<String> {
    if depth >= options.max_depth || content.chars().count() <= options.base_size {
        let mut single = Vec::with_capacity(1);
        push_trimmed(&mut single, content);
        return single;
    }

    let factor = 2usize.saturating_pow(u32::try_from(depth).unwrap_or(u32::MAX));
    let pass = FixedSizeOptions {
        chunk_size: options.base_size.saturating_mul(factor),
        overlap: options.base_size / 10,
    };

    let pieces = chunk_by_fixed_size(content, &pass);

    // A pass that leaves the content whole would do the same at every depth.
    if let [only] = pieces.as_slice() {
        if only == content.trim() {
            return pieces;
        }
    }

    pieces
        .iter()
        .flat_map(|piece| chunk_recursively_at(piece, options, depth + 1))
        .collect()
}

/// Split markdown into heading sections.
///
/// Content before the first heading becomes its own chunk, then each
/// heading line together with its body (up to the next heading) becomes one
/// chunk. A document without headings is a single chunk.
pub fn chunk_by_markdown(content: &str) -> Vec<String> {
    let starts: Vec<usize> = HEADING_RE.find_iter(content).map(|m| m.start()).collect();
    let mut chunks = Vec::new();

    let Some(&first) = starts.first() else {
        push_trimmed(&mut chunks, content);
        return chunks;
    };

    push_trimmed(&mut chunks, &content[..first]);
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        push_trimmed(&mut chunks, &content[start..end]);
    }

    chunks
}

/// Count, mean, min, and max character length of a chunk sequence.
///
/// An empty sequence yields all-zero statistics rather than `NaN` or
/// infinite bounds.
pub fn chunk_statistics<S: AsRef<str>>(chunks: &[S]) -> ChunkStatistics {
    if chunks.is_empty() {
        return ChunkStatistics::default();
    }

    let lengths: Vec<usize> = chunks.iter().map(|c| c.as_ref().chars().count()).collect();
    let total: usize = lengths.iter().sum();

    ChunkStatistics {
        total_chunks: lengths.len(),
        average_length: total as f64 / lengths.len() as f64,
        min_length: lengths.iter().copied().min().unwrap_or(0),
        max_length: lengths.iter().copied().max().unwrap_or(0),
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
