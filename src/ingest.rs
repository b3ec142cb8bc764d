//! Adding documents: manual text entry and file uploads.
//!
//! Uploaded files are converted to text by extension, tagged with their
//! lowercase extension, and skipped when a document with the same content
//! hash already exists.
//!
//! | Extension | Stored content | Type |
//! |-----------|----------------|------|
//! | `.txt` | file text | text |
//! | `.md`, `.markdown` | file text, chunked by headings | text |
//! | `.json` | file text, after validation | text |
//! | `.csv` | pretty JSON `{ headers, data }` | spreadsheet |
//! | `.docx` | paragraph text | document |
//! | `.xlsx` | shared-string cell text | spreadsheet |

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use tracing::{info, warn};
use walkdir::WalkDir;

use script_kb_core::{ContentType, Document, DocumentType, NewDocument};

use crate::config::Config;
use crate::extract;
use crate::sqlite_store::{content_hash, open_knowledge_base, SqliteKnowledgeBase};

pub const SOURCE_MANUAL: &str = "manual";
pub const SOURCE_UPLOAD: &str = "upload";

/// Upload formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Markdown,
    Json,
    Csv,
    Docx,
    Xlsx,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = extension(path)?;
        match ext.as_str() {
            "txt" => Some(FileKind::Text),
            "md" | "markdown" => Some(FileKind::Markdown),
            "json" => Some(FileKind::Json),
            "csv" => Some(FileKind::Csv),
            "docx" => Some(FileKind::Docx),
            "xlsx" => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    fn doc_type(&self) -> DocumentType {
        match self {
            FileKind::Text | FileKind::Markdown | FileKind::Json => DocumentType::Text,
            FileKind::Docx => DocumentType::Document,
            FileKind::Csv | FileKind::Xlsx => DocumentType::Spreadsheet,
        }
    }

    fn content_type(&self) -> ContentType {
        match self {
            FileKind::Markdown => ContentType::Markdown,
            _ => ContentType::Text,
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Split a comma-separated tag list, trimming and dropping empty entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Parse CSV text into `{ "headers": [...], "data": [{header: value}, ...] }`.
///
/// The first line is the header row. Fields are split on commas and
/// trimmed; missing trailing fields become empty strings; rows whose values
/// are all empty are skipped.
pub fn parse_csv(text: &str) -> Value {
    let mut lines = text.lines();
    let headers: Vec<String> = lines
        .next()
        .map(|l| l.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_default();

    let data: Vec<Value> = lines
        .filter_map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            let mut row = Map::new();
            for (i, header) in headers.iter().enumerate() {
                let value = values.get(i).map(|v| v.trim()).unwrap_or("");
                row.insert(header.clone(), Value::String(value.to_string()));
            }
            row.values()
                .any(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                .then_some(Value::Object(row))
        })
        .collect();

    json!({ "headers": headers, "data": data })
}

/// Convert file bytes into a [`NewDocument`] according to the file kind.
pub fn prepare_upload(path: &Path, bytes: &[u8], extra_tags: &[String]) -> Result<NewDocument> {
    let kind = FileKind::from_path(path)
        .with_context(|| format!("unsupported file type: {}", path.display()))?;

    let as_text = || {
        std::str::from_utf8(bytes)
            .map(|s| s.trim_start_matches('\u{feff}').to_string())
            .with_context(|| format!("{} is not valid UTF-8", path.display()))
    };

    let content = match kind {
        FileKind::Text | FileKind::Markdown => as_text()?,
        FileKind::Json => {
            let text = as_text()?;
            serde_json::from_str::<Value>(&text)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            text
        }
        FileKind::Csv => serde_json::to_string_pretty(&parse_csv(&as_text()?))?,
        FileKind::Docx => extract::extract_docx(bytes)
            .with_context(|| format!("failed to read {}", path.display()))?,
        FileKind::Xlsx => extract::extract_xlsx(bytes)
            .with_context(|| format!("failed to read {}", path.display()))?,
    };

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut tags: Vec<String> = extension(path).into_iter().collect();
    for tag in extra_tags {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    Ok(NewDocument {
        title,
        content,
        doc_type: kind.doc_type(),
        source: SOURCE_UPLOAD.to_string(),
        tags,
        content_type: kind.content_type(),
    })
}

/// Result of uploading one file.
#[derive(Debug)]
pub enum UploadOutcome {
    Added(Document),
    /// Identical content is already stored under this id.
    Duplicate(String),
}

/// Read, convert, and store one file.
pub async fn upload_file(
    kb: &SqliteKnowledgeBase,
    config: &Config,
    path: &Path,
    extra_tags: &[String],
) -> Result<UploadOutcome> {
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
    let new_doc = prepare_upload(path, &bytes, extra_tags)?;

    if let Some(existing) = kb
        .store()
        .find_by_hash(&content_hash(&new_doc.content))
        .await?
    {
        info!(file = %path.display(), existing = %existing, "skipping duplicate upload");
        return Ok(UploadOutcome::Duplicate(existing));
    }

    Ok(UploadOutcome::Added(kb.add_document(new_doc).await?))
}

/// `skb add --title T --content C`.
pub async fn run_add_text(config: &Config, title: &str, content: &str, tags: &[String]) -> Result<()> {
    if title.trim().is_empty() || content.trim().is_empty() {
        bail!("title and content must not be empty");
    }

    let kb = open_knowledge_base(config).await?;
    let doc = kb
        .add_document(NewDocument {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            doc_type: DocumentType::Text,
            source: SOURCE_MANUAL.to_string(),
            tags: tags.to_vec(),
            content_type: ContentType::Text,
        })
        .await?;

    print_added(&doc);
    kb.store().close().await;
    Ok(())
}

/// `skb add --file PATH`.
pub async fn run_add_file(config: &Config, path: &Path, tags: &[String]) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let outcome = upload_file(&kb, config, path, tags).await;
    kb.store().close().await;

    match outcome? {
        UploadOutcome::Added(doc) => print_added(&doc),
        UploadOutcome::Duplicate(id) => {
            println!("skipped {} (already stored as {})", path.display(), id)
        }
    }
    Ok(())
}

/// `skb import DIR`: upload every supported file below a directory.
///
/// Unsupported files are ignored; files that fail to convert are reported
/// and skipped without aborting the import.
pub async fn run_import(config: &Config, dir: &Path, tags: &[String]) -> Result<()> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let kb = open_knowledge_base(config).await?;
    let mut added = 0u64;
    let mut duplicates = 0u64;
    let mut failed = 0u64;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || FileKind::from_path(path).is_none() {
            continue;
        }

        match upload_file(&kb, config, path, tags).await {
            Ok(UploadOutcome::Added(doc)) => {
                added += 1;
                print_added(&doc);
            }
            Ok(UploadOutcome::Duplicate(_)) => duplicates += 1,
            Err(e) => {
                failed += 1;
                warn!(file = %path.display(), error = %e, "skipping file");
            }
        }
    }

    kb.store().close().await;

    println!("import {}", dir.display());
    println!("  added: {}", added);
    println!("  duplicates skipped: {}", duplicates);
    println!("  failed: {}", failed);
    println!("ok");
    Ok(())
}

fn print_added(doc: &Document) {
    println!(
        "added {} [{}] {} ({} chunks)",
        doc.id,
        doc.doc_type,
        doc.title,
        doc.chunk_slice().len()
    );
}
