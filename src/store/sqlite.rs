/*!
 * SQLite-backed segment store.
 *
 * One table, one file. Nested metadata travels as JSON columns so the
 * schema stays stable while the Rust-side types evolve.
 */

use async_trait::async_trait;
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::segment::{Segment, SegmentMetadata, SegmentStatus, TranslationMeta};

use super::{SegmentFilter, SegmentStore, SegmentUpdate, SortOrder};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS segments (
    id                  TEXT PRIMARY KEY,
    file_id             TEXT NOT NULL,
    idx                 INTEGER NOT NULL,
    source_text         TEXT NOT NULL,
    translation         TEXT,
    final_text          TEXT,
    status              TEXT NOT NULL,
    source_length       INTEGER NOT NULL,
    translated_length   INTEGER,
    metadata            TEXT NOT NULL,
    translation_meta    TEXT,
    error               TEXT
);
CREATE INDEX IF NOT EXISTS idx_segments_file ON segments (file_id, idx);
CREATE INDEX IF NOT EXISTS idx_segments_status ON segments (file_id, status);
"#;

/// SQLite implementation of [`SegmentStore`].
#[derive(Clone)]
pub struct SqliteSegmentStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSegmentStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }
        info!("Opening segment store at {:?}", db_path);
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_segment(row: &Row<'_>) -> Result<Segment, rusqlite::Error> {
        let status: String = row.get("status")?;
        let metadata: String = row.get("metadata")?;
        let translation_meta: Option<String> = row.get("translation_meta")?;
        Ok(Segment {
            id: row.get("id")?,
            file_id: row.get("file_id")?,
            index: row.get::<_, i64>("idx")? as usize,
            source_text: row.get("source_text")?,
            translation: row.get("translation")?,
            final_text: row.get("final_text")?,
            status: status.parse::<SegmentStatus>().unwrap_or(SegmentStatus::Pending),
            source_length: row.get::<_, i64>("source_length")? as usize,
            translated_length: row
                .get::<_, Option<i64>>("translated_length")?
                .map(|n| n as usize),
            metadata: serde_json::from_str::<SegmentMetadata>(&metadata).unwrap_or_default(),
            translation_meta: translation_meta
                .and_then(|json| serde_json::from_str::<TranslationMeta>(&json).ok()),
            error: row.get("error")?,
        })
    }

    /// Build the WHERE clause and owned parameters for a filter.
    fn filter_clause(filter: &SegmentFilter) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(file_id) = &filter.file_id {
            params.push(file_id.clone());
            clauses.push(format!("file_id = ?{}", params.len()));
        }
        if let Some(statuses) = &filter.statuses {
            let mut placeholders = Vec::new();
            for status in statuses {
                params.push(status.to_string());
                placeholders.push(format!("?{}", params.len()));
            }
            if placeholders.is_empty() {
                // No statuses allowed means nothing matches
                clauses.push("1 = 0".to_string());
            } else {
                clauses.push(format!("status IN ({})", placeholders.join(", ")));
            }
        }
        let clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (clause, params)
    }
}

#[async_trait]
impl SegmentStore for SqliteSegmentStore {
    async fn find_many(
        &self,
        filter: &SegmentFilter,
        sort: SortOrder,
    ) -> Result<Vec<Segment>, StoreError> {
        let (clause, params) = Self::filter_clause(filter);
        let order = match sort {
            SortOrder::ByIndex => " ORDER BY idx ASC",
            SortOrder::Unordered => "",
        };
        let sql = format!("SELECT * FROM segments{}{}", clause, order);

        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Self::row_to_segment(row)
        })?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?);
        }
        Ok(segments)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Segment>, StoreError> {
        let conn = self.connection.lock();
        let segment = conn
            .query_row("SELECT * FROM segments WHERE id = ?1", params![id], |row| {
                Self::row_to_segment(row)
            })
            .optional()?;
        Ok(segment)
    }

    async fn update_one(&self, id: &str, update: SegmentUpdate) -> Result<(), StoreError> {
        // Read-modify-write keeps the partial-update semantics in one place
        // (SegmentUpdate::apply) instead of duplicating them in SQL.
        let conn = self.connection.lock();
        let mut segment = conn
            .query_row("SELECT * FROM segments WHERE id = ?1", params![id], |row| {
                Self::row_to_segment(row)
            })
            .optional()?
            .ok_or_else(|| StoreError::Database(format!("no segment with id {}", id)))?;
        update.apply(&mut segment);

        let metadata = serde_json::to_string(&segment.metadata)?;
        let translation_meta = segment
            .translation_meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        conn.execute(
            r#"
            UPDATE segments SET
                translation = ?2, final_text = ?3, status = ?4,
                translated_length = ?5, metadata = ?6, translation_meta = ?7, error = ?8
            WHERE id = ?1
            "#,
            params![
                segment.id,
                segment.translation,
                segment.final_text,
                segment.status.to_string(),
                segment.translated_length.map(|n| n as i64),
                metadata,
                translation_meta,
                segment.error,
            ],
        )?;
        Ok(())
    }

    async fn insert_many(&self, segments: Vec<Segment>) -> Result<usize, StoreError> {
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        let count = segments.len();
        for segment in segments {
            let metadata = serde_json::to_string(&segment.metadata)?;
            let translation_meta = segment
                .translation_meta
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO segments (
                    id, file_id, idx, source_text, translation, final_text, status,
                    source_length, translated_length, metadata, translation_meta, error
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    segment.id,
                    segment.file_id,
                    segment.index as i64,
                    segment.source_text,
                    segment.translation,
                    segment.final_text,
                    segment.status.to_string(),
                    segment.source_length as i64,
                    segment.translated_length.map(|n| n as i64),
                    metadata,
                    translation_meta,
                    segment.error,
                ],
            )?;
        }
        tx.commit()?;
        Ok(count)
    }

    async fn delete_many(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        let (clause, params) = Self::filter_clause(filter);
        let sql = format!("DELETE FROM segments{}", clause);
        let conn = self.connection.lock();
        let deleted = conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(deleted)
    }

    async fn count_documents(&self, filter: &SegmentFilter) -> Result<usize, StoreError> {
        let (clause, params) = Self::filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM segments{}", clause);
        let conn = self.connection.lock();
        let count: i64 =
            conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }
}
