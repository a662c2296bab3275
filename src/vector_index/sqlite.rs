//! SQLite-based vector index implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large namespaces, consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{
    cosine_similarity, matches_filter, rank_scored, IndexRecord, IndexedSource, QueryMatch,
    QueryOptions, RecordMetadata, VectorIndex,
};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    namespace TEXT NOT NULL,
    id TEXT NOT NULL,
    source_id TEXT NOT NULL,
    text TEXT NOT NULL,
    start_offset REAL NOT NULL,
    end_offset REAL NOT NULL,
    vector BLOB NOT NULL,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (namespace, id)
);

CREATE INDEX IF NOT EXISTS idx_records_source ON records(namespace, source_id);
"#;

/// SQLite-based vector index.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Open (or create) a vector index at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Serialize a vector to little-endian bytes.
    fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
        vector.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize a vector from little-endian bytes.
    fn bytes_to_vector(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SvarError::VectorIndex(format!("Failed to acquire lock: {}", e)))
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexRecord> {
    let bytes: Vec<u8> = row.get(5)?;
    Ok(IndexRecord {
        id: row.get(0)?,
        vector: SqliteVectorIndex::bytes_to_vector(&bytes),
        metadata: RecordMetadata {
            source_id: row.get(1)?,
            text: row.get(2)?,
            start_offset: row.get(3)?,
            end_offset: row.get(4)?,
        },
    })
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, namespace: &str, records: &[IndexRecord]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let indexed_at = Utc::now().to_rfc3339();
        for record in records {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO records
                (namespace, id, source_id, text, start_offset, end_offset, vector, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    namespace,
                    record.id,
                    record.metadata.source_id,
                    record.metadata.text,
                    record.metadata.start_offset,
                    record.metadata.end_offset,
                    Self::vector_to_bytes(&record.vector),
                    indexed_at,
                ],
            )?;
        }

        tx.commit()?;
        debug!("Upserted {} records into {}", records.len(), namespace);

        Ok(())
    }

    #[instrument(skip(self, vector, options))]
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<QueryMatch>> {
        let conn = self.lock()?;

        // Push the source restriction into SQL when present; remaining
        // filter keys are checked in Rust.
        let candidates = match options.filter.get("source_id") {
            Some(source_id) => {
                let mut stmt = conn.prepare(
                    "SELECT id, source_id, text, start_offset, end_offset, vector
                     FROM records WHERE namespace = ?1 AND source_id = ?2",
                )?;
                let rows = stmt.query_map(params![namespace, source_id], row_to_record)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, source_id, text, start_offset, end_offset, vector
                     FROM records WHERE namespace = ?1",
                )?;
                let rows = stmt.query_map(params![namespace], row_to_record)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        let mut scored: Vec<(f32, IndexRecord)> = Vec::new();
        for record in candidates {
            if !matches_filter(&record.metadata, &options.filter)? {
                continue;
            }
            let score = cosine_similarity(vector, &record.vector);
            scored.push((score, record));
        }

        rank_scored(&mut scored);
        scored.truncate(options.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| QueryMatch {
                score,
                metadata: record.metadata,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, namespace: &str, source_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM records WHERE namespace = ?1 AND source_id = ?2",
            params![namespace, source_id],
        )?;
        Ok(removed)
    }

    async fn list_sources(&self, namespace: &str) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT source_id, COUNT(*), MAX(end_offset), MAX(indexed_at)
             FROM records WHERE namespace = ?1
             GROUP BY source_id ORDER BY source_id",
        )?;

        let rows = stmt.query_map(params![namespace], |row| {
            let indexed_at: String = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, f64>(2)?,
                indexed_at,
            ))
        })?;

        let mut sources = Vec::new();
        for row in rows {
            let (source_id, record_count, max_end_offset, indexed_at) = row?;
            let indexed_at = DateTime::parse_from_rfc3339(&indexed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            sources.push(IndexedSource {
                source_id,
                record_count,
                max_end_offset,
                indexed_at,
            });
        }

        Ok(sources)
    }

    async fn record_count(&self, namespace: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE namespace = ?1",
            params![namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
