//! SQLite-backed work catalog.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use super::{CatalogEntry, CatalogStats, CatalogStore, StoreError, WorkFields, WorkId};

const SELECT_COLUMNS: &str = "id, title, composer, instrumentation, style, period, year, key, \
                              permalink, raw_metadata, pdf_urls";

/// SQLite-backed work catalog.
pub struct SqliteCatalogStore {
    conn: Mutex<Connection>,
}

impl SqliteCatalogStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS works (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                composer TEXT NOT NULL,
                instrumentation TEXT NOT NULL DEFAULT '',
                style TEXT NOT NULL DEFAULT '',
                period TEXT NOT NULL DEFAULT '',
                year TEXT NOT NULL DEFAULT '',
                key TEXT NOT NULL DEFAULT '',
                permalink TEXT NOT NULL,
                raw_metadata TEXT NOT NULL DEFAULT '{}',
                pdf_urls TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX IF NOT EXISTS idx_works_composer ON works(composer);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<(CatalogEntry, String, String)> {
        let entry = CatalogEntry {
            id: row.get(0)?,
            fields: WorkFields {
                title: row.get(1)?,
                composer: row.get(2)?,
                instrumentation: row.get(3)?,
                style: row.get(4)?,
                period: row.get(5)?,
                year: row.get(6)?,
                key: row.get(7)?,
            },
            permalink: row.get(8)?,
            raw_metadata: Default::default(),
            pdf_urls: Vec::new(),
        };
        Ok((entry, row.get(9)?, row.get(10)?))
    }

    /// Decode the serialized JSON columns into the entry.
    fn finish_entry(
        (mut entry, raw_metadata, pdf_urls): (CatalogEntry, String, String),
    ) -> Result<CatalogEntry, StoreError> {
        entry.raw_metadata = serde_json::from_str(&raw_metadata)?;
        entry.pdf_urls = serde_json::from_str(&pdf_urls)?;
        Ok(entry)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn upsert(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let raw_metadata = serde_json::to_string(&entry.raw_metadata)?;
        let pdf_urls = serde_json::to_string(&entry.pdf_urls)?;
        let fields = &entry.fields;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO works (id, title, composer, instrumentation, style, period, year, key,
                                permalink, raw_metadata, pdf_urls)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                composer = excluded.composer,
                instrumentation = excluded.instrumentation,
                style = excluded.style,
                period = excluded.period,
                year = excluded.year,
                key = excluded.key,
                permalink = excluded.permalink,
                raw_metadata = excluded.raw_metadata,
                pdf_urls = excluded.pdf_urls",
            params![
                entry.id,
                &fields.title,
                &fields.composer,
                &fields.instrumentation,
                &fields.style,
                &fields.period,
                &fields.year,
                &fields.key,
                &entry.permalink,
                &raw_metadata,
                &pdf_urls,
            ],
        )?;

        debug!(id = entry.id, "Upserted catalog entry");
        Ok(())
    }

    fn get(&self, id: WorkId) -> Result<CatalogEntry, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM works WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::row_to_entry,
            )
            .optional()?;

        match row {
            Some(row) => Self::finish_entry(row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn get_many(&self, ids: &[WorkId]) -> Result<Vec<CatalogEntry>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM works WHERE id IN ({}) ORDER BY id",
            SELECT_COLUMNS, placeholders
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Self::finish_entry(row?)?);
        }
        Ok(entries)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM works", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn stats(&self) -> Result<CatalogStats, StoreError> {
        let conn = self.lock()?;
        let (total_works, total_composers): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT composer) FROM works",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CatalogStats {
            total_works: total_works as u64,
            total_composers: total_composers as u64,
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM works", [])?;
        Ok(())
    }
}
