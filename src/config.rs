//! TOML configuration parsing and validation.
//!
//! Only `[db].path` is required; every other section falls back to the
//! defaults of the core library.
//!
//! ```toml
//! [db]
//! path = "./data/skb.sqlite"
//!
//! [chunking]
//! ingest_threshold = 1000
//! recursive_threshold = 2000
//! sentence_threshold = 500
//!
//! [chunking.fixed_size]
//! chunk_size = 300
//! overlap = 30
//!
//! [retrieval]
//! max_items = 3
//!
//! [ingest]
//! max_file_size_mb = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use script_kb_core::dispatch::ChunkingPolicy;
use script_kb_core::retrieve::{DEFAULT_INGEST_THRESHOLD, DEFAULT_MAX_ITEMS};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Content longer than this many characters is chunked at ingestion.
    #[serde(default = "default_ingest_threshold")]
    pub ingest_threshold: usize,
    /// Dispatcher thresholds and per-strategy options.
    #[serde(flatten)]
    pub policy: ChunkingPolicy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            ingest_threshold: default_ingest_threshold(),
            policy: ChunkingPolicy::default(),
        }
    }
}

fn default_ingest_threshold() -> usize {
    DEFAULT_INGEST_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    10
}

impl IngestConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Config {
    /// Defaults for commands that never touch the database
    /// (`skb chunk`, `skb optimize`).
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/skb.sqlite"),
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Upper bound for `chunking.recursive.max_depth`.
const MAX_RECURSIVE_DEPTH: usize = 16;

fn validate(config: &Config) -> Result<()> {
    let policy = &config.chunking.policy;

    if policy.fixed_size.chunk_size == 0 {
        anyhow::bail!("chunking.fixed_size.chunk_size must be > 0");
    }
    if policy.sentence.max_sentences == 0 {
        anyhow::bail!("chunking.sentence.max_sentences must be > 0");
    }
    if policy.recursive.base_size == 0 {
        anyhow::bail!("chunking.recursive.base_size must be > 0");
    }
    if policy.recursive.max_depth > MAX_RECURSIVE_DEPTH {
        anyhow::bail!(
            "chunking.recursive.max_depth must be <= {}",
            MAX_RECURSIVE_DEPTH
        );
    }
    if policy.sentence_threshold > policy.recursive_threshold {
        anyhow::bail!("chunking.sentence_threshold must be <= chunking.recursive_threshold");
    }

    if config.retrieval.max_items < 1 {
        anyhow::bail!("retrieval.max_items must be >= 1");
    }

    if config.ingest.max_file_size_mb < 1 {
        anyhow::bail!("ingest.max_file_size_mb must be >= 1");
    }

    Ok(())
}
