//! Database-free commands: `skb chunk` and `skb optimize`.
//!
//! `skb chunk` converts a file exactly as an upload would, then shows the
//! chunks a strategy produces for it together with their statistics.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use script_kb_core::chunk::FixedSizeOptions;
use script_kb_core::dispatch::{select_strategy_with, ChunkStrategy, ChunkingPolicy};
use script_kb_core::models::ChunkStatistics;
use script_kb_core::query::optimize_query;
use script_kb_core::{chunk_statistics, ContentType};

use crate::config::Config;
use crate::ingest::prepare_upload;

/// Resolve a `--strategy` name against the configured policy.
///
/// `auto` picks the strategy the ingestion dispatcher would pick. An
/// explicit `fixed` runs the standalone fixed-size chunker with its own
/// defaults (300 chars, overlap 50); the policy's fixed-size options only
/// apply as the dispatcher's fallback.
pub fn resolve_strategy(
    name: &str,
    content: &str,
    content_type: ContentType,
    policy: &ChunkingPolicy,
) -> Result<ChunkStrategy> {
    Ok(match name {
        "auto" => select_strategy_with(content, content_type, policy),
        "fixed" => ChunkStrategy::FixedSize(FixedSizeOptions::default()),
        "sentence" => ChunkStrategy::Sentences(policy.sentence),
        "recursive" => ChunkStrategy::Recursive(policy.recursive),
        "markdown" => ChunkStrategy::Markdown,
        other => bail!(
            "Unknown strategy: {}. Use auto, fixed, sentence, recursive, or markdown.",
            other
        ),
    })
}

#[derive(Debug, Serialize)]
struct ChunkPreview<'a> {
    strategy: &'a str,
    statistics: ChunkStatistics,
    chunks: &'a [String],
}

pub fn run_chunk(config: &Config, path: &Path, strategy: &str, json: bool) -> Result<()> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?
        .len();
    if size > config.ingest.max_file_size_bytes() {
        bail!(
            "{} exceeds the size limit ({} MB)",
            path.display(),
            config.ingest.max_file_size_mb
        );
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let doc = prepare_upload(path, &bytes, &[])?;

    let strategy = resolve_strategy(
        strategy,
        &doc.content,
        doc.content_type,
        &config.chunking.policy,
    )?;
    let chunks = strategy.apply(&doc.content);
    let statistics = chunk_statistics(&chunks);

    if json {
        let preview = ChunkPreview {
            strategy: strategy.name(),
            statistics,
            chunks: &chunks,
        };
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!("chunk {}", path.display());
    println!("  strategy: {}", strategy.name());
    println!("  characters: {}", doc.content.chars().count());
    println!("  chunks: {}", statistics.total_chunks);
    println!(
        "  length: avg {:.1}, min {}, max {}",
        statistics.average_length, statistics.min_length, statistics.max_length
    );
    println!();
    for (index, chunk) in chunks.iter().enumerate() {
        println!("[chunk {}] ({} chars)", index, chunk.chars().count());
        println!("{}", chunk);
        println!();
    }
    Ok(())
}

pub fn run_optimize(query: &str) {
    println!("{}", optimize_query(query));
}
