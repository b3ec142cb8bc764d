//! # Script KB CLI (`skb`)
//!
//! The `skb` binary manages a local knowledge base for dialogue-script
//! generation: it stores documents (typed in or uploaded from files),
//! chunks long ones at ingestion, and retrieves the entries most relevant
//! to a query.
//!
//! ## Usage
//!
//! ```bash
//! skb --config ./config/skb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `skb init` | Create the SQLite database and tables |
//! | `skb add` | Add a manual entry (`--title`/`--content`) or a file (`--file`) |
//! | `skb import <dir>` | Upload every supported file under a directory |
//! | `skb list` | List stored documents |
//! | `skb get <id>` | Show a document and its chunks |
//! | `skb remove <id>` | Delete a document |
//! | `skb search "<query>"` | Substring pre-filter over title, content, and tags |
//! | `skb retrieve "<query>"` | Ranked retrieval (`--json` for templating) |
//! | `skb chunk <file>` | Preview chunking of a file (no database) |
//! | `skb optimize "<query>"` | Show the optimized form of a query (no database) |
//! | `skb stats` | Knowledge-base statistics |
//!
//! ## Examples
//!
//! ```bash
//! skb init
//! skb add --title "退货政策" --content "七天无理由退货。" --tags faq,售后
//! skb add --file ./docs/产品手册.docx
//! skb import ./docs --tags product
//! skb retrieve "请问 什么是 区块链" --max 5 --json
//! skb chunk ./docs/guide.md --strategy auto
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use script_kb::{config, get, ingest, migrate, preview, search, stats};

/// Script KB: a local knowledge base with document chunking and lexical
/// retrieval for dialogue-script generation.
///
/// Commands that touch the database read a TOML configuration file given
/// by `--config`. See `config/skb.example.toml` for every option.
#[derive(Parser)]
#[command(
    name = "skb",
    about = "Script KB: a local knowledge base with chunking and lexical retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/skb.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `documents` and `chunks`
    /// tables. Safe to run repeatedly.
    Init,

    /// Add a document.
    ///
    /// Either a manual entry (`--title` and `--content`) or a file upload
    /// (`--file`). Content longer than `chunking.ingest_threshold`
    /// characters is chunked before it is stored.
    Add {
        /// Title of a manual entry.
        #[arg(long, conflicts_with = "file")]
        title: Option<String>,

        /// Text of a manual entry.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// File to upload (.txt, .md, .json, .csv, .docx, .xlsx).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },

    /// Upload every supported file under a directory.
    Import {
        /// Directory to walk.
        dir: PathBuf,

        /// Comma-separated tags added to every imported document.
        #[arg(long)]
        tags: Option<String>,
    },

    /// List stored documents in insertion order.
    List,

    /// Show a document with its content and chunks.
    Get {
        /// Document UUID.
        id: String,
    },

    /// Delete a document and its chunks.
    Remove {
        /// Document UUID.
        id: String,
    },

    /// Case-insensitive substring search over titles, content, and tags.
    Search {
        /// The search string.
        query: String,
    },

    /// Retrieve the documents most relevant to a query.
    ///
    /// The query is normalized (question prefixes and stopwords removed),
    /// candidates are pre-filtered, and each is scored by term overlap
    /// against its best chunk.
    Retrieve {
        /// The query.
        query: String,

        /// Maximum number of results (defaults to `retrieval.max_items`).
        #[arg(long)]
        max: Option<usize>,

        /// Print results as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Preview how a file would be chunked.
    Chunk {
        /// File to chunk.
        path: PathBuf,

        /// Strategy: `auto`, `fixed`, `sentence`, `recursive`, or `markdown`.
        #[arg(long, default_value = "auto")]
        strategy: String,

        /// Print the chunks and statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the optimized form of a query.
    Optimize {
        /// The query.
        query: String,
    },

    /// Show knowledge-base statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "script_kb=debug,script_kb_core=debug"
    } else {
        "script_kb=info,script_kb_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Commands that don't require a database
    match &cli.command {
        Commands::Optimize { query } => {
            preview::run_optimize(query);
            return Ok(());
        }
        Commands::Chunk {
            path,
            strategy,
            json,
        } => {
            // Use config if available, otherwise the defaults
            let cfg =
                config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
            preview::run_chunk(&cfg, path, strategy, *json)?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add {
            title,
            content,
            file,
            tags,
        } => {
            let tags = tags.as_deref().map(ingest::parse_tags).unwrap_or_default();
            match (file, title, content) {
                (Some(path), _, _) => ingest::run_add_file(&cfg, &path, &tags).await?,
                (None, Some(title), Some(content)) => {
                    ingest::run_add_text(&cfg, &title, &content, &tags).await?
                }
                _ => anyhow::bail!("add requires --file, or both --title and --content"),
            }
        }
        Commands::Import { dir, tags } => {
            let tags = tags.as_deref().map(ingest::parse_tags).unwrap_or_default();
            ingest::run_import(&cfg, &dir, &tags).await?;
        }
        Commands::List => {
            get::run_list(&cfg).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Remove { id } => {
            get::run_remove(&cfg, &id).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
        Commands::Retrieve { query, max, json } => {
            search::run_retrieve(&cfg, &query, max, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Optimize { .. } | Commands::Chunk { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
