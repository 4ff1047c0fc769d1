//! Versioned SQLite schema for the catalog database.

use anyhow::{bail, Result};
use rusqlite::Connection;

/// Offset applied to `PRAGMA user_version` so a db file created by an
/// unrelated tool (user_version 0 by default) is not mistaken for ours.
pub const BASE_DB_VERSION: usize = 7000;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub create: fn(&Connection, &VersionedSchema) -> Result<()>,
    pub migration: Option<fn(&Connection) -> Result<()>>,
    pub validate: fn(&Connection) -> Result<()>,
}

/// V 0
///
/// The unique index on (LOWER(artist_name), LOWER(song_title)) is the
/// authoritative duplicate guard: the service-level duplicate check is an
/// early exit only, and concurrent inserts for the same pair are resolved
/// here.
const CATALOG_ENTRY_TABLE_V_0: Table = Table {
    name: "catalog_entry",
    schema: "CREATE TABLE catalog_entry (id INTEGER PRIMARY KEY AUTOINCREMENT, artist_name TEXT NOT NULL, genre TEXT, song_title TEXT NOT NULL, song_url TEXT NOT NULL, public_id TEXT NOT NULL, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &[
        "CREATE UNIQUE INDEX catalog_entry_artist_title_index ON catalog_entry (LOWER(artist_name), LOWER(song_title));",
    ],
};

fn create_v0(conn: &Connection, schema: &VersionedSchema) -> Result<()> {
    for table in schema.tables {
        conn.execute(table.schema, [])?;
        for index in table.indices {
            conn.execute(index, [])?;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
        [],
    )?;
    Ok(())
}

fn validate_schema_0(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(catalog_entry);")?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))?
        .collect::<Result<_, _>>()?;

    if columns
        != [
            "id",
            "artist_name",
            "genre",
            "song_title",
            "song_url",
            "public_id",
            "created",
        ]
    {
        bail!(
            "Schema validation failed for catalog_entry table, found {:?}",
            columns
        );
    }

    Ok(())
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[CATALOG_ENTRY_TABLE_V_0],
    create: create_v0,
    migration: None,
    validate: validate_schema_0,
}];
