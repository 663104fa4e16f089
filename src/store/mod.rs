//! SQLite content store: schema setup plus a write repository and the read contract
//! consumed by front-ends. Every function takes the connection or transaction explicitly.

mod read;
#[cfg(test)]
mod tests;
mod write;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::util::{ensure_dir, rfc3339_now};

pub use read::{
    count_elements, elements_with_links, find_solution, get_element, get_element_at,
    get_random_element, get_subsection, links_from, list_sections, table_counts,
};
pub use write::{
    SubsectionRef, SubsectionUpsert, add_element, add_link, seed_element_type, seed_section,
    upsert_subsection,
};

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let connection =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn open_in_memory() -> Result<Connection> {
    let connection =
        Connection::open_in_memory().context("failed to open in-memory content store")?;
    enable_foreign_keys(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    enable_foreign_keys(connection)
}

fn enable_foreign_keys(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to set foreign_keys=ON")
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sections (
              id INTEGER PRIMARY KEY,
              number INTEGER NOT NULL UNIQUE,
              title TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS subsections (
              id INTEGER PRIMARY KEY,
              section_id INTEGER NOT NULL,
              number INTEGER NOT NULL,
              title TEXT NOT NULL,
              UNIQUE(section_id, number),
              FOREIGN KEY(section_id) REFERENCES sections(id)
            );

            CREATE TABLE IF NOT EXISTS element_types (
              id INTEGER PRIMARY KEY,
              name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS elements (
              id INTEGER PRIMARY KEY,
              subsection_id INTEGER NOT NULL,
              type_id INTEGER NOT NULL,
              number TEXT NOT NULL,
              content TEXT NOT NULL,
              UNIQUE(subsection_id, type_id, number),
              FOREIGN KEY(subsection_id) REFERENCES subsections(id),
              FOREIGN KEY(type_id) REFERENCES element_types(id)
            );

            CREATE TABLE IF NOT EXISTS element_links (
              id INTEGER PRIMARY KEY,
              source_element_id INTEGER NOT NULL,
              target_element_id INTEGER NOT NULL,
              UNIQUE(source_element_id, target_element_id),
              FOREIGN KEY(source_element_id) REFERENCES elements(id),
              FOREIGN KEY(target_element_id) REFERENCES elements(id)
            );

            CREATE INDEX IF NOT EXISTS idx_elements_type ON elements(type_id);
            CREATE INDEX IF NOT EXISTS idx_element_links_target ON element_links(target_element_id);
            ",
        )
        .context("failed to initialize content store schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [rfc3339_now()],
    )?;

    Ok(())
}

pub fn metadata_value(connection: &Connection, key: &str) -> Result<Option<String>> {
    let value = connection
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}
