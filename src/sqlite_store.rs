//! SQLite-backed [`DocumentStore`].
//!
//! Documents live in the `documents` table; their chunks (when present) in
//! `chunks`, keyed by `(document_id, chunk_index)`. Listing order is
//! insertion order (`rowid`). Search loads the collection and applies the
//! same case-insensitive substring filter as the in-memory store, so both
//! implementations agree on which documents are candidates.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use script_kb_core::store::{document_matches, DocumentStore};
use script_kb_core::{Document, KnowledgeBase, SmartChunker};

use crate::config::Config;
use crate::{db, migrate};

/// Knowledge base over the configured SQLite database.
pub type SqliteKnowledgeBase = KnowledgeBase<SqliteStore, SmartChunker>;

/// Open the configured database (creating the schema if needed) and wrap it
/// in a knowledge base using the configured chunking policy.
pub async fn open_knowledge_base(config: &Config) -> Result<SqliteKnowledgeBase> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    Ok(KnowledgeBase::with_chunker(
        SqliteStore::new(pool),
        SmartChunker::new(config.chunking.policy),
        config.chunking.ingest_threshold,
    ))
}

/// Hex SHA-256 of document content, used to skip re-uploads.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Fetch one document by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, title, content, doc_type, source, tags_json, created_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let chunk_rows = sqlx::query(
            "SELECT text FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let chunks: Vec<String> = chunk_rows.iter().map(|r| r.get("text")).collect();
        Ok(Some(row_to_document(&row, chunks)?))
    }

    /// Id of a stored document whose content hashes to `hash`, if any.
    pub async fn find_by_hash(&self, hash: &str) -> Result<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM documents WHERE content_hash = ? LIMIT 1")
                .bind(hash)
                .fetch_optional(&self.pool)
                .await?;
        Ok(id)
    }

    async fn load_all(&self) -> Result<Vec<Document>> {
        let doc_rows = sqlx::query(
            "SELECT id, title, content, doc_type, source, tags_json, created_at FROM documents ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let chunk_rows = sqlx::query(
            "SELECT document_id, text FROM chunks ORDER BY document_id ASC, chunk_index ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut chunks_by_doc: HashMap<String, Vec<String>> = HashMap::new();
        for row in &chunk_rows {
            chunks_by_doc
                .entry(row.get("document_id"))
                .or_default()
                .push(row.get("text"));
        }

        doc_rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let chunks = chunks_by_doc.remove(&id).unwrap_or_default();
                row_to_document(row, chunks)
            })
            .collect()
    }
}

fn row_to_document(row: &SqliteRow, chunks: Vec<String>) -> Result<Document> {
    let id: String = row.get("id");
    let doc_type: String = row.get("doc_type");
    let tags_json: String = row.get("tags_json");
    let created_at: String = row.get("created_at");

    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .with_context(|| format!("invalid tags for document {}", id))?;
    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .with_context(|| format!("invalid timestamp for document {}", id))?
        .with_timezone(&Utc);

    Ok(Document {
        id,
        title: row.get("title"),
        content: row.get("content"),
        chunks: if chunks.is_empty() { None } else { Some(chunks) },
        tags,
        doc_type: doc_type.parse()?,
        source: row.get("source"),
        timestamp,
    })
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn add(&self, doc: &Document) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO documents (id, title, content, doc_type, source, tags_json, content_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.doc_type.as_str())
        .bind(&doc.source)
        .bind(serde_json::to_string(&doc.tags)?)
        .bind(content_hash(&doc.content))
        .bind(doc.timestamp.to_rfc3339())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (index, text) in doc.chunk_slice().iter().enumerate() {
            sqlx::query("INSERT INTO chunks (document_id, chunk_index, text) VALUES (?, ?, ?)")
                .bind(&doc.id)
                .bind(index as i64)
                .bind(text)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn get(&self) -> Result<Vec<Document>> {
        self.load_all().await
    }

    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|d| document_matches(d, query))
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use script_kb_core::DocumentType;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::migrate::create_schema(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    fn doc(id: &str, title: &str, chunks: Option<Vec<&str>>) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            content: format!("content of {}", title),
            chunks: chunks.map(|c| c.into_iter().map(String::from).collect()),
            tags: vec!["csv".into(), "faq".into()],
            doc_type: DocumentType::Spreadsheet,
            source: "upload".into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_and_get_round_trip() {
        let store = store().await;
        let original = doc("a", "Alpha", Some(vec!["one", "two", "three"]));
        assert!(store.add(&original).await.unwrap());

        let loaded = store.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Alpha");
        assert_eq!(loaded.doc_type, DocumentType::Spreadsheet);
        assert_eq!(loaded.tags, original.tags);
        assert_eq!(loaded.chunks, original.chunks);
        assert_eq!(loaded.timestamp.timestamp(), original.timestamp.timestamp());
    }

    #[tokio::test]
    async fn test_duplicate_id_returns_false() {
        let store = store().await;
        assert!(store.add(&doc("a", "Alpha", None)).await.unwrap());
        assert!(!store.add(&doc("a", "Other", None)).await.unwrap());
        assert_eq!(store.get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_keeps_insertion_order() {
        let store = store().await;
        for (id, title) in [("z", "Zeta"), ("a", "Alpha"), ("m", "Mu")] {
            store.add(&doc(id, title, None)).await.unwrap();
        }
        let ids: Vec<String> = store.get().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_search_matches_title_content_and_tags() {
        let store = store().await;
        store.add(&doc("a", "Rust Guide", None)).await.unwrap();
        store.add(&doc("b", "Cooking", None)).await.unwrap();

        assert_eq!(store.search("rust").await.unwrap().len(), 1);
        assert_eq!(store.search("CONTENT OF cooking").await.unwrap().len(), 1);
        assert_eq!(store.search("faq").await.unwrap().len(), 2);
        assert_eq!(store.search("  ").await.unwrap().len(), 2);
        assert!(store.search("python").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_deletes_chunks() {
        let store = store().await;
        store.add(&doc("a", "Alpha", Some(vec!["x", "y"]))).await.unwrap();
        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let store = store().await;
        let d = doc("a", "Alpha", None);
        store.add(&d).await.unwrap();
        assert_eq!(
            store.find_by_hash(&content_hash(&d.content)).await.unwrap(),
            Some("a".to_string())
        );
        assert!(store.find_by_hash(&content_hash("other")).await.unwrap().is_none());
    }
}
