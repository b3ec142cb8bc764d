//! Core data models shared by the chunking, retrieval, and storage layers.
//!
//! These types represent the knowledge-base documents, the caller-supplied
//! input that becomes a document, and the transient results handed to the
//! script-templating consumer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of knowledge-base entry, derived from how the content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Plain text, markdown, or JSON.
    #[default]
    Text,
    /// Word-processor documents (`.docx`).
    Document,
    /// Tabular data (`.csv`, `.xlsx`).
    Spreadsheet,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Text => "text",
            DocumentType::Document => "document",
            DocumentType::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(DocumentType::Text),
            "document" => Ok(DocumentType::Document),
            "spreadsheet" => Ok(DocumentType::Spreadsheet),
            other => anyhow::bail!("unknown document type: '{}'", other),
        }
    }
}

/// Declared format of a document body, used to pick a chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Text,
    Markdown,
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    /// Only `"markdown"` selects [`ContentType::Markdown`]; every other
    /// value is treated as plain text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "markdown" => ContentType::Markdown,
            _ => ContentType::Text,
        })
    }
}

/// A knowledge-base entry.
///
/// `content` is immutable once set. `chunks` is present only when the
/// content exceeded the ingestion threshold at creation time and is never
/// recomputed on read. Missing `content`/`chunks` fields in serialized
/// input deserialize as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl Document {
    /// The chunk sequence, or an empty slice for unchunked documents.
    pub fn chunk_slice(&self) -> &[String] {
        self.chunks.as_deref().unwrap_or(&[])
    }
}

/// Caller-supplied fields for a document that has not been ingested yet.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub doc_type: DocumentType,
    pub source: String,
    pub tags: Vec<String>,
    /// Body format, consulted only when the content is chunked.
    pub content_type: ContentType,
}

/// One ranked entry returned by knowledge retrieval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResult {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Percentage of query terms found in the best candidate text, `[0, 100]`.
    pub relevance: f64,
    /// The winning chunk; only set for chunked documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_chunk: Option<String>,
}

/// Aggregate diagnostics over a chunk sequence. Lengths are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStatistics {
    pub total_chunks: usize,
    pub average_length: f64,
    pub min_length: usize,
    pub max_length: usize,
}
