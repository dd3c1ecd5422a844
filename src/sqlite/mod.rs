//! SQLite backend for the translation memory corpus.
//!
//! This module provides:
//! - `Database`: connection, schema, and batch writes of embedded records
//! - `blob`: embedding BLOB encoding
//!
//! Every row and the index as a whole carry the version stamp of the
//! embedder that produced the vectors.

pub mod blob;

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Error;
use crate::types::{ContentType, MemoryRecord};

pub use self::blob::{blob_to_vec, vec_to_blob};

type Result<T> = std::result::Result<T, Error>;

const EMBEDDING_VERSION_KEY: &str = "embedding_version";

/// SQLite database backend for lokal.
pub struct Database {
    conn: Connection,
}

/// Initialize database schema.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            source_text TEXT NOT NULL,
            translation TEXT NOT NULL,
            target_language TEXT NOT NULL,
            content_type TEXT NOT NULL,
            product_category TEXT NOT NULL,
            brand_notes TEXT,
            embedding BLOB NOT NULL,
            embedding_version TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_language ON records(target_language);

        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

impl Database {
    /// Open or create a SQLite database at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Embedding version the index was stamped with, if any records were ever written.
    pub fn embedding_version(&self) -> Result<Option<String>> {
        let version = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                [EMBEDDING_VERSION_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// Distinct per-row embedding versions, in first-seen order.
    pub fn record_versions(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT embedding_version FROM records GROUP BY embedding_version ORDER BY MIN(rowid)",
        )?;
        let versions = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(versions)
    }

    /// Load every record in ingestion order.
    pub fn load_records(&self) -> Result<Vec<MemoryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, source_text, translation, target_language, content_type,
                   product_category, brand_notes, embedding
            FROM records
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Vec<u8>>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                id,
                source_text,
                translation,
                target_language,
                content_type,
                product_category,
                brand_notes,
                blob,
            ) = row?;
            records.push(MemoryRecord {
                id,
                source_text,
                translation,
                target_language,
                content_type: ContentType::parse(&content_type),
                product_category,
                brand_notes,
                embedding: blob_to_vec(&blob)?,
            });
        }
        Ok(records)
    }

    /// Append records in a single transaction and stamp the index version.
    pub fn insert_records(&mut self, records: &[MemoryRecord], version: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_records(&tx, records, version)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the whole corpus in a single transaction.
    pub fn replace_records(&mut self, records: &[MemoryRecord], version: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        write_records(&tx, records, version)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_records(conn: &Connection, records: &[MemoryRecord], version: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO records (id, source_text, translation, target_language, content_type,
                                 product_category, brand_notes, embedding, embedding_version, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )?;
        for record in records {
            let blob = vec_to_blob(&record.embedding)?;
            stmt.execute(params![
                &record.id,
                &record.source_text,
                &record.translation,
                &record.target_language,
                record.content_type.as_str(),
                &record.product_category,
                &record.brand_notes,
                &blob,
                version,
                &now,
            ])?;
        }
    }
    conn.execute(
        r#"
        INSERT INTO index_meta (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
        params![EMBEDDING_VERSION_KEY, version],
    )?;
    Ok(())
}
