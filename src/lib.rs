//! # Script KB
//!
//! A local knowledge base for dialogue-script generation.
//!
//! Documents are typed in or uploaded from files, chunked at ingestion when
//! they are long, and stored in SQLite. Retrieval normalizes the query,
//! pre-filters candidates by substring, scores each candidate's best chunk
//! by term overlap, and returns the top entries for script templating.
//!
//! The algorithms live in the `script-kb-core` crate; this crate adds the
//! SQLite store, file ingestion, configuration, and the `skb` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Files/Text  │──▶│ Extract+Chunk │──▶│  SQLite  │
//! │ txt/md/csv… │   │  (core)       │   │ docs+chk │
//! └─────────────┘   └──────────────┘   └────┬─────┘
//!                                            │
//!                                            ▼
//!                                  ┌───────────────────┐
//!                                  │ retrieve (core)   │
//!                                  │ optimize → rank   │
//!                                  └───────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `DocumentStore` and knowledge-base construction |
//! | [`extract`] | `.docx` / `.xlsx` text extraction |
//! | [`ingest`] | Manual entries, file uploads, directory import |
//! | [`search`] | Pre-filter search and ranked retrieval commands |
//! | [`get`] | List, show, and remove documents |
//! | [`stats`] | Knowledge-base statistics |
//! | [`preview`] | Chunk preview and query optimization commands |

pub mod config;
pub mod db;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod preview;
pub mod search;
pub mod sqlite_store;
pub mod stats;
