// Single-row schema version marker stored inside each profile database

use crate::utils::error::{LaxmiError, Result};
use rusqlite::{Connection, OptionalExtension};

pub struct SchemaVersionStore;

impl SchemaVersionStore {
    /// Make sure the `_schema` table and its single row exist.
    ///
    /// A fresh database starts at version 0. An existing row is left alone,
    /// so this is safe to run on every open.
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _schema (
                version INTEGER NOT NULL
            )",
            [],
        )?;

        let existing: Option<u32> = conn
            .query_row("SELECT version FROM _schema LIMIT 1", [], |row| row.get(0))
            .optional()?;

        if existing.is_none() {
            conn.execute("INSERT INTO _schema (version) VALUES (0)", [])?;
        }

        Ok(())
    }

    /// Whether [`SchemaVersionStore::initialize`] has run against `conn`.
    pub fn is_initialized(conn: &Connection) -> Result<bool> {
        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_schema')",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(false);
        }

        let has_row: bool =
            conn.query_row("SELECT EXISTS(SELECT 1 FROM _schema)", [], |row| row.get(0))?;
        Ok(has_row)
    }

    /// Stored version; an uninitialized database is a caller bug.
    pub fn current(conn: &Connection) -> Result<u32> {
        if !Self::is_initialized(conn)? {
            return Err(LaxmiError::SchemaNotInitialized);
        }

        let version: u32 =
            conn.query_row("SELECT version FROM _schema LIMIT 1", [], |row| row.get(0))?;
        tracing::debug!("Current schema version: {}", version);
        Ok(version)
    }

    /// Replace whatever rows exist with exactly one holding `version`.
    pub fn set(conn: &Connection, version: u32) -> Result<()> {
        conn.execute("DELETE FROM _schema", [])?;
        conn.execute("INSERT INTO _schema (version) VALUES (?1)", [version])?;
        Ok(())
    }
}
