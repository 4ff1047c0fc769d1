//! SQLite-backed catalog store implementation.

use super::schema::{BASE_DB_VERSION, VERSIONED_SCHEMAS};
use super::trait_def::{CatalogStore, StoreError};
use crate::catalog::{CatalogEntry, CatalogEntrySummary, NewCatalogEntry};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            Self::create_schema(&conn)?;
            conn
        };

        let version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, usize>(0))
            .context("Failed to read catalog database version")?
            - BASE_DB_VERSION;

        if version >= VERSIONED_SCHEMAS.len() {
            bail!("Catalog database version {} is too new", version);
        }
        (VERSIONED_SCHEMAS
            .get(version)
            .context("Failed to get schema")?
            .validate)(&conn)?;

        Self::migrate_if_needed(&conn, version)?;

        let entry_count: usize =
            conn.query_row("SELECT COUNT(*) FROM catalog_entry", [], |r| r.get(0))?;
        info!("Catalog store ready: {} entries", entry_count);

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let latest_version = VERSIONED_SCHEMAS
            .last()
            .context("No schema versions defined")?;
        (latest_version.create)(conn, latest_version)
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating catalog db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }
}

fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        artist_name: row.get(1)?,
        genre: row.get(2)?,
        song_title: row.get(3)?,
        song_url: row.get(4)?,
        public_id: row.get(5)?,
    })
}

fn map_insert_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation
        }
        _ => StoreError::Unavailable(err),
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn find_by_artist_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<CatalogEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, artist_name, genre, song_title, song_url, public_id
             FROM catalog_entry
             WHERE LOWER(artist_name) = LOWER(?1) AND LOWER(song_title) = LOWER(?2)",
        )?;
        let entry = stmt
            .query_row(params![artist, title], entry_from_row)
            .optional()?;
        Ok(entry)
    }

    fn list_all(&self) -> Result<Vec<CatalogEntrySummary>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, artist_name, genre, song_title, song_url
             FROM catalog_entry ORDER BY id",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CatalogEntrySummary {
                    id: row.get(0)?,
                    artist: row.get(1)?,
                    genre: row.get(2)?,
                    song: row.get(3)?,
                    url: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<CatalogEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, artist_name, genre, song_title, song_url, public_id
             FROM catalog_entry WHERE id = ?1",
        )?;
        let entry = stmt.query_row(params![id], entry_from_row).optional()?;
        Ok(entry)
    }

    fn insert(&self, entry: &NewCatalogEntry) -> Result<CatalogEntry, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO catalog_entry (artist_name, genre, song_title, song_url, public_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.artist_name,
                entry.genre,
                entry.song_title,
                entry.song_url,
                entry.public_id,
            ],
        )
        .map_err(map_insert_error)?;

        Ok(CatalogEntry {
            id: conn.last_insert_rowid(),
            artist_name: entry.artist_name.clone(),
            genre: entry.genre.clone(),
            song_title: entry.song_title.clone(),
            song_url: entry.song_url.clone(),
            public_id: entry.public_id.clone(),
        })
    }

    fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM catalog_entry WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
