//! Knowledge-base statistics.
//!
//! `skb stats` summarises what is stored: document counts per type and per
//! source, how many documents were chunked at ingestion, and length
//! statistics over every stored chunk.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::Row;

use script_kb_core::chunk_statistics;

use crate::config::Config;
use crate::sqlite_store::open_knowledge_base;

pub async fn run_stats(config: &Config) -> Result<()> {
    let kb = open_knowledge_base(config).await?;
    let pool = kb.store().pool();

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(pool)
        .await?;

    let chunked_docs: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT document_id) FROM chunks")
            .fetch_one(pool)
            .await?;

    let chunk_texts: Vec<String> = sqlx::query_scalar("SELECT text FROM chunks")
        .fetch_all(pool)
        .await?;
    let chunk_stats = chunk_statistics(&chunk_texts);

    let type_rows = sqlx::query(
        "SELECT doc_type, COUNT(*) AS n FROM documents GROUP BY doc_type ORDER BY n DESC, doc_type ASC",
    )
    .fetch_all(pool)
    .await?;

    let source_rows = sqlx::query(
        "SELECT source, COUNT(*) AS n FROM documents GROUP BY source ORDER BY n DESC, source ASC",
    )
    .fetch_all(pool)
    .await?;

    let last_added: Option<String> =
        sqlx::query_scalar("SELECT created_at FROM documents ORDER BY rowid DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    kb.store().close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Script KB: Knowledge Base Stats");
    println!("================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", total_docs);
    println!("  Chunked:     {}", chunked_docs);
    println!("  Chunks:      {}", chunk_stats.total_chunks);
    if chunk_stats.total_chunks > 0 {
        println!(
            "  Chunk chars: avg {:.1}, min {}, max {}",
            chunk_stats.average_length, chunk_stats.min_length, chunk_stats.max_length
        );
    }
    if let Some(ts) = last_added {
        println!("  Last added:  {}", format_age(&ts, Utc::now()));
    }

    print_breakdown("By type:", "TYPE", &type_rows, "doc_type");
    print_breakdown("By source:", "SOURCE", &source_rows, "source");
    println!();

    Ok(())
}

fn print_breakdown(heading: &str, label: &str, rows: &[sqlx::sqlite::SqliteRow], column: &str) {
    if rows.is_empty() {
        return;
    }
    println!();
    println!("  {}", heading);
    println!("  {:<16} {:>6}", label, "DOCS");
    println!("  {}", "-".repeat(23));
    for row in rows {
        let name: String = row.get(column);
        let n: i64 = row.get("n");
        println!("  {:<16} {:>6}", name, n);
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format an RFC 3339 timestamp relative to `now` (e.g. "3 hours ago").
fn format_age(ts: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = DateTime::parse_from_rfc3339(ts) else {
        return ts.to_string();
    };
    let then = then.with_timezone(&Utc);
    let delta = (now - then).num_seconds();

    if delta < 0 || delta >= 86400 * 30 {
        then.format("%Y-%m-%d %H:%M").to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}
