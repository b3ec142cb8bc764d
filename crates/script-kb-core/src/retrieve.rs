//! Knowledge retrieval orchestration.
//!
//! [`KnowledgeBase`] ties the pieces together over an injected
//! [`DocumentStore`] and [`Chunker`]:
//!
//! - **Ingestion** ([`KnowledgeBase::add_document`]): documents longer than
//!   the ingestion threshold are chunked once, before being stored.
//! - **Retrieval** ([`KnowledgeBase::retrieve_knowledge`]):
//!   1. Optimize the query ([`optimize_query`]).
//!   2. Pre-filter candidates with [`DocumentStore::search`].
//!   3. Score every chunk of a chunked document and keep the best one, or
//!      score the whole content of an unchunked document.
//!   4. Sort by descending relevance (stable, so ties keep store order).
//!   5. Truncate to `max_items`.
//!
//! Steps 3–5 are the pure function [`rank_documents`].

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::chunk::chunk_statistics;
use crate::dispatch::{Chunker, SmartChunker};
use crate::models::{Document, NewDocument, RetrievalResult};
use crate::query::optimize_query;
use crate::relevance::calculate_relevance;
use crate::store::DocumentStore;

/// Content longer than this many characters is chunked at ingestion.
pub const DEFAULT_INGEST_THRESHOLD: usize = 1000;

/// Number of results returned when the caller does not ask for a count.
pub const DEFAULT_MAX_ITEMS: usize = 3;

/// Score one document against an already-optimized query.
///
/// For chunked documents the first chunk with the strictly highest score
/// wins and is attached as `most_relevant_chunk`.
pub fn score_document(query: &str, doc: &Document) -> RetrievalResult {
    let best = doc.chunk_slice().iter().fold(None::<(&String, f64)>, |best, chunk| {
        let score = calculate_relevance(query, chunk);
        match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((chunk, score)),
        }
    });

    let (relevance, most_relevant_chunk) = match best {
        Some((chunk, score)) => (score, Some(chunk.clone())),
        None => (calculate_relevance(query, &doc.content), None),
    };

    RetrievalResult {
        id: doc.id.clone(),
        title: doc.title.clone(),
        content: doc.content.clone(),
        relevance,
        most_relevant_chunk,
    }
}

/// Score, sort, and truncate candidate documents.
pub fn rank_documents(query: &str, candidates: &[Document], max_items: usize) -> Vec<RetrievalResult> {
    let mut results: Vec<RetrievalResult> = candidates
        .iter()
        .map(|doc| score_document(query, doc))
        .collect();

    results.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(max_items);
    results
}

/// A knowledge base over a document store.
pub struct KnowledgeBase<S, C = SmartChunker> {
    store: S,
    chunker: C,
    ingest_threshold: usize,
}

impl<S: DocumentStore> KnowledgeBase<S, SmartChunker> {
    /// Knowledge base with the default chunker and ingestion threshold.
    pub fn new(store: S) -> Self {
        Self::with_chunker(store, SmartChunker::default(), DEFAULT_INGEST_THRESHOLD)
    }
}

impl<S: DocumentStore, C: Chunker> KnowledgeBase<S, C> {
    pub fn with_chunker(store: S, chunker: C, ingest_threshold: usize) -> Self {
        Self {
            store,
            chunker,
            ingest_threshold,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ingest_threshold(&self) -> usize {
        self.ingest_threshold
    }

    /// Build a [`Document`] from caller input: assign an id and timestamp,
    /// and chunk the content when it exceeds the ingestion threshold.
    ///
    /// Chunking that produces no chunks leaves `chunks` unset.
    pub fn prepare_document(&self, new: NewDocument) -> Document {
        let chunks = if new.content.chars().count() > self.ingest_threshold {
            let chunks = self.chunker.chunk(&new.content, new.content_type);
            let stats = chunk_statistics(&chunks);
            debug!(
                title = %new.title,
                total = stats.total_chunks,
                average = stats.average_length,
                min = stats.min_length,
                max = stats.max_length,
                "chunked document"
            );
            Some(chunks).filter(|c| !c.is_empty())
        } else {
            None
        };

        Document {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            content: new.content,
            chunks,
            tags: new.tags,
            doc_type: new.doc_type,
            source: new.source,
            timestamp: Utc::now(),
        }
    }

    /// Prepare and store a new document, returning it.
    pub async fn add_document(&self, new: NewDocument) -> Result<Document> {
        let doc = self.prepare_document(new);
        if !self.store.add(&doc).await? {
            bail!("document store rejected '{}'", doc.title);
        }
        Ok(doc)
    }

    /// Retrieve the `max_items` documents most relevant to `query`.
    pub async fn retrieve_knowledge(
        &self,
        query: &str,
        max_items: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let optimized = optimize_query(query);
        debug!(raw = query, optimized = %optimized, "optimized query");

        let candidates = self.store.search(&optimized).await?;
        Ok(rank_documents(&optimized, &candidates, max_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::store::memory::InMemoryStore;

    fn doc(id: &str, content: &str, chunks: Option<Vec<&str>>) -> Document {
        Document {
            id: id.into(),
            title: format!("title {}", id),
            content: content.into(),
            chunks: chunks.map(|c| c.into_iter().map(String::from).collect()),
            tags: vec![],
            doc_type: Default::default(),
            source: "manual".into(),
            timestamp: Utc::now(),
        }
    }

    /// Content containing the first `hits` of ten query terms.
    fn content_with_hits(hits: usize) -> String {
        (0..hits).map(|i| format!("term{} ", i)).collect()
    }

    fn ten_term_query() -> String {
        (0..10).map(|i| format!("term{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_rank_order_and_truncate() {
        let docs = vec![
            doc("low", &content_with_hits(1), None),
            doc("high", &content_with_hits(9), None),
            doc("mid", &content_with_hits(5), None),
        ];
        let results = rank_documents(&ten_term_query(), &docs, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "high");
        assert!((results[0].relevance - 90.0).abs() < 1e-9);
        assert_eq!(results[1].id, "mid");
        assert!((results[1].relevance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_store_order() {
        let docs = vec![doc("a", "x", None), doc("b", "x", None), doc("c", "x", None)];
        let ids: Vec<String> = rank_documents("x", &docs, 3)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_best_chunk_first_wins_ties() {
        let d = doc(
            "d",
            "whole content mentions alpha and beta",
            Some(vec!["nothing", "alpha one", "alpha two", "alpha beta"]),
        );
        let r = score_document("alpha beta", &d);
        assert_eq!(r.relevance, 100.0);
        assert_eq!(r.most_relevant_chunk.as_deref(), Some("alpha beta"));

        let r = score_document("alpha", &d);
        assert_eq!(r.most_relevant_chunk.as_deref(), Some("alpha one"));
    }

    #[test]
    fn test_zero_scores_keep_first_chunk() {
        let d = doc("d", "", Some(vec!["first", "second"]));
        let r = score_document("missing", &d);
        assert_eq!(r.relevance, 0.0);
        assert_eq!(r.most_relevant_chunk.as_deref(), Some("first"));
    }

    #[test]
    fn test_unchunked_scores_whole_content() {
        let d = doc("d", "alpha", None);
        let r = score_document("alpha", &d);
        assert_eq!(r.relevance, 100.0);
        assert!(r.most_relevant_chunk.is_none());

        let empty_chunks = doc("e", "alpha", Some(vec![]));
        let r = score_document("alpha", &empty_chunks);
        assert_eq!(r.relevance, 100.0);
        assert!(r.most_relevant_chunk.is_none());
    }

    #[test]
    fn test_rank_empty_inputs() {
        assert!(rank_documents("q", &[], 3).is_empty());
        let docs = vec![doc("a", "text", None)];
        assert!(rank_documents("q", &docs, 0).is_empty());
        assert_eq!(rank_documents("", &docs, 3)[0].relevance, 0.0);
    }

    #[tokio::test]
    async fn test_add_document_chunks_long_content() {
        let kb = KnowledgeBase::new(InMemoryStore::new());

        let short = kb
            .add_document(NewDocument {
                title: "short".into(),
                content: "字".repeat(1000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(short.chunks.is_none());

        let long = kb
            .add_document(NewDocument {
                title: "long".into(),
                content: "这是一个句子。".repeat(200),
                ..Default::default()
            })
            .await
            .unwrap();
        let chunks = long.chunks.as_ref().unwrap();
        assert!(chunks.len() > 1);

        let stored = kb.store().get().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1], long);
    }

    #[tokio::test]
    async fn test_add_document_uses_injected_chunker() {
        struct Halves;
        impl Chunker for Halves {
            fn chunk(&self, content: &str, _: ContentType) -> Vec<String> {
                let mid = content.len() / 2;
                vec![content[..mid].to_string(), content[mid..].to_string()]
            }
        }

        let kb = KnowledgeBase::with_chunker(InMemoryStore::new(), Halves, 3);
        let d = kb
            .add_document(NewDocument {
                title: "t".into(),
                content: "abcdef".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(d.chunks, Some(vec!["abc".to_string(), "def".to_string()]));
    }

    #[tokio::test]
    async fn test_retrieve_knowledge_end_to_end() {
        let kb = KnowledgeBase::new(InMemoryStore::new());
        for (title, content) in [
            ("区块链入门", "区块链是一种分布式账本技术。"),
            ("烹饪", "今天学习做红烧肉。"),
        ] {
            kb.add_document(NewDocument {
                title: title.into(),
                content: content.into(),
                tags: vec!["manual".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let results = kb.retrieve_knowledge("请问  什么是   区块链", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "区块链入门");
        assert_eq!(results[0].relevance, 100.0);
    }

    #[tokio::test]
    async fn test_retrieve_blank_query_returns_all_with_zero_score() {
        let kb = KnowledgeBase::new(InMemoryStore::with_documents(vec![
            doc("a", "x", None),
            doc("b", "y", None),
            doc("c", "z", None),
            doc("d", "w", None),
        ]));
        let results = kb.retrieve_knowledge("   ", DEFAULT_MAX_ITEMS).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.relevance == 0.0));
    }

    #[tokio::test]
    async fn test_retrieve_from_empty_store() {
        let kb = KnowledgeBase::new(InMemoryStore::new());
        assert!(kb.retrieve_knowledge("anything", 3).await.unwrap().is_empty());
    }
}
