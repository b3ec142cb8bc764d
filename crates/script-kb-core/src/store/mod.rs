//! Storage abstraction for the knowledge base.
//!
//! The [`DocumentStore`] trait is the only seam between the retrieval core
//! and persistence. The core never mutates a stored [`Document`]; it builds
//! a complete document (chunks included) and hands it to
//! [`add`](DocumentStore::add).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Document;

/// Abstract document collection.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`add`](DocumentStore::add) | Append a document; `false` if it was not stored |
/// | [`get`](DocumentStore::get) | All documents, in insertion order |
/// | [`search`](DocumentStore::search) | Pre-filter by substring over title, content, and tags |
/// | [`remove`](DocumentStore::remove) | Delete by id; `false` if no such document |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append a document to the collection.
    async fn add(&self, doc: &Document) -> Result<bool>;

    /// Every stored document, in insertion order.
    async fn get(&self) -> Result<Vec<Document>>;

    /// Documents whose title, content, or any tag contains `query`
    /// (case-insensitive), in insertion order. A blank query returns the
    /// whole collection. See [`document_matches`].
    async fn search(&self, query: &str) -> Result<Vec<Document>>;

    /// Delete the document with the given id.
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// The search predicate shared by every [`DocumentStore`] implementation.
///
/// The query is trimmed and lowercased, then matched as a single substring
/// (it is not split into terms). A blank query matches everything.
pub fn document_matches(doc: &Document, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    doc.title.to_lowercase().contains(&needle)
        || doc.content.to_lowercase().contains(&needle)
        || doc
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
}
