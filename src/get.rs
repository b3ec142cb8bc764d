//! Document listing, lookup by id, and removal.

use anyhow::{bail, Result};

use script_kb_core::store::DocumentStore;
use script_kb_core::Document;

use crate::config::Config;
use crate::sqlite_store::open_knowledge_base;

/// One line of `skb list` output.
pub fn list_line(doc: &Document) -> String {
    format!(
        "{}  {:<11} {}  {:>4}  {}",
        doc.id,
        doc.doc_type,
        doc.timestamp.format("%Y-%m-%d"),
        doc.chunk_slice().len(),
        doc.title
    )
}

pub async fn run_list(config: &Config) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let docs = kb.store().get().await?;
    kb.store().close().await;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<11} {:<10}  {:>4}  TITLE",
        "ID", "TYPE", "ADDED", "CHNK"
    );
    for doc in &docs {
        println!("{}", list_line(doc));
    }
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let doc = kb.store().get_by_id(id).await?;
    kb.store().close().await;

    let Some(doc) = doc else {
        bail!("document not found: {}", id);
    };

    println!("--- Document ---");
    println!("id:        {}", doc.id);
    println!("title:     {}", doc.title);
    println!("type:      {}", doc.doc_type);
    println!("source:    {}", doc.source);
    println!("tags:      {}", doc.tags.join(", "));
    println!("added:     {}", doc.timestamp.format("%Y-%m-%dT%H:%M:%SZ"));
    println!();

    println!("--- Content ---");
    println!("{}", doc.content);
    println!();

    let chunks = doc.chunk_slice();
    println!("--- Chunks ({}) ---", chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        println!("[chunk {}]", index);
        println!("{}", chunk);
        println!();
    }

    Ok(())
}

pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let removed = kb.store().remove(id).await;
    kb.store().close().await;

    if !removed? {
        bail!("document not found: {}", id);
    }
    println!("removed {}", id);
    Ok(())
}
