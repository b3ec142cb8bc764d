//! In-memory [`DocumentStore`] implementation for testing and embedding.
//!
//! Keeps documents in a `Vec` behind `std::sync::RwLock`, so insertion
//! order is preserved and the store is `Send + Sync`.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::Document;

use super::{document_matches, DocumentStore};

/// In-memory document collection.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `docs`, in order.
    pub fn with_documents(docs: Vec<Document>) -> Self {
        Self {
            docs: RwLock::new(docs),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn add(&self, doc: &Document) -> Result<bool> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        if docs.iter().any(|d| d.id == doc.id) {
            return Ok(false);
        }
        docs.push(doc.clone());
        Ok(true)
    }

    async fn get(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().map_err(poisoned)?.clone())
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let docs = self.docs.read().map_err(poisoned)?;
        Ok(docs
            .iter()
            .filter(|d| document_matches(d, query))
            .cloned()
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }
}
