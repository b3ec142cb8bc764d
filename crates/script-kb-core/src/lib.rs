//! # script-kb core
//!
//! Document chunking, query optimization, lexical relevance scoring, and
//! knowledge retrieval for the script-kb knowledge base.
//!
//! This crate contains no filesystem, database, or runtime dependencies.
//! Persistence is reached only through the [`store::DocumentStore`] trait.
//!
//! ## Pipeline
//!
//! ```text
//! ingest:   content ──▶ dispatch ──▶ chunk (+ boundary) ──▶ Document.chunks
//! retrieve: query ──▶ optimize ──▶ store.search ──▶ relevance ──▶ ranked results
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`boundary`] | Snap cut positions to sentence terminators |
//! | [`chunk`] | Fixed-size, sentence, recursive, and markdown chunkers; chunk statistics |
//! | [`dispatch`] | Strategy selection by content type and length; `Chunker` seam |
//! | [`query`] | Query normalization, prefix stripping, keyword extraction |
//! | [`relevance`] | Term-overlap relevance score |
//! | [`retrieve`] | `KnowledgeBase`: ingestion and ranked retrieval |
//! | [`models`] | `Document`, `NewDocument`, `RetrievalResult`, `ChunkStatistics` |
//! | [`store`] | `DocumentStore` trait and in-memory implementation |

pub mod boundary;
pub mod chunk;
pub mod dispatch;
pub mod models;
pub mod query;
pub mod relevance;
pub mod retrieve;
pub mod store;

pub use chunk::chunk_statistics;
pub use dispatch::{smart_chunking, ChunkingPolicy, Chunker, SmartChunker};
pub use models::{ContentType, Document, DocumentType, NewDocument, RetrievalResult};
pub use query::optimize_query;
pub use relevance::calculate_relevance;
pub use retrieve::KnowledgeBase;
