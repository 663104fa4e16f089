use anyhow::Result;
use rusqlite::{OptionalExtension, Transaction, params};
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::model::{ElementKind, SectionSeed};
use crate::parse::{clean_content, normalize_number};

use super::read::{section_id, subsection_id_at};

/// How an element names the subsection it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsectionRef {
    Id(i64),
    Address { section: u32, subsection: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsectionUpsert {
    pub id: i64,
    pub created: bool,
}

pub fn seed_section(tx: &Transaction<'_>, seed: &SectionSeed) -> Result<bool> {
    let changed = tx.execute(
        "INSERT INTO sections(number, title) VALUES(?1, ?2)
         ON CONFLICT(number) DO NOTHING",
        params![seed.number, seed.title.trim()],
    )?;
    Ok(changed == 1)
}

pub fn seed_element_type(tx: &Transaction<'_>, kind: ElementKind) -> Result<bool> {
    let changed = tx.execute(
        "INSERT INTO element_types(name) VALUES(?1) ON CONFLICT(name) DO NOTHING",
        [kind],
    )?;
    Ok(changed == 1)
}

/// Type row for `kind`, created on first use. Creation outside the seed list is legal but
/// reported so a drifting vocabulary stays visible.
pub fn ensure_element_type(tx: &Transaction<'_>, kind: ElementKind) -> Result<i64> {
    let existing = tx
        .query_row(
            "SELECT id FROM element_types WHERE name = ?1",
            [kind],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if let Some(type_id) = existing {
        return Ok(type_id);
    }

    warn!(element_type = %kind, "element type missing from store; creating it");
    tx.execute("INSERT INTO element_types(name) VALUES(?1)", [kind])?;
    Ok(tx.last_insert_rowid())
}

/// Subsections are only ever created from a title line. The parent section must already
/// exist; a missing one is a configuration error.
pub fn upsert_subsection(
    tx: &Transaction<'_>,
    section_number: u32,
    number: u32,
    title: &str,
) -> Result<SubsectionUpsert> {
    let section_id =
        section_id(tx, section_number)?.ok_or(IngestError::missing_section(section_number))?;

    let existing = tx
        .query_row(
            "SELECT id, title FROM subsections WHERE section_id = ?1 AND number = ?2",
            params![section_id, number],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    if let Some((id, stored_title)) = existing {
        if stored_title != title {
            debug!(
                section = section_number,
                subsection = number,
                stored = %stored_title,
                parsed = %title,
                "keeping stored subsection title"
            );
        }
        return Ok(SubsectionUpsert { id, created: false });
    }

    tx.execute(
        "INSERT INTO subsections(section_id, number, title) VALUES(?1, ?2, ?3)",
        params![section_id, number, title],
    )?;

    Ok(SubsectionUpsert {
        id: tx.last_insert_rowid(),
        created: true,
    })
}

pub fn resolve_subsection(tx: &Transaction<'_>, subsection: SubsectionRef) -> Result<i64> {
    match subsection {
        SubsectionRef::Id(id) => Ok(id),
        SubsectionRef::Address {
            section,
            subsection,
        } => {
            if let Some(id) = subsection_id_at(tx, section, subsection)? {
                return Ok(id);
            }
            if section_id(tx, section)?.is_none() {
                return Err(IngestError::missing_section(section).into());
            }
            Err(IngestError::missing_subsection(section, subsection).into())
        }
    }
}

/// Inserts the element at (subsection, kind, number) unless that address is already
/// taken. Returns whether a row was created; an existing row is never modified.
pub fn add_element(
    tx: &Transaction<'_>,
    subsection: SubsectionRef,
    kind: ElementKind,
    number: &str,
    content: &str,
) -> Result<bool> {
    let subsection_id = resolve_subsection(tx, subsection)?;
    let type_id = ensure_element_type(tx, kind)?;
    let number = normalize_number(number);

    let existing = tx
        .query_row(
            "SELECT id FROM elements WHERE subsection_id = ?1 AND type_id = ?2 AND number = ?3",
            params![subsection_id, type_id, number],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(false);
    }

    tx.execute(
        "INSERT INTO elements(subsection_id, type_id, number, content) VALUES(?1, ?2, ?3, ?4)",
        params![subsection_id, type_id, number, clean_content(content)],
    )?;
    debug!(subsection_id, element_type = %kind, number = %number, "inserted element");
    Ok(true)
}

pub fn add_link(tx: &Transaction<'_>, source_element_id: i64, target_element_id: i64) -> Result<bool> {
    let changed = tx.execute(
        "INSERT INTO element_links(source_element_id, target_element_id) VALUES(?1, ?2)
         ON CONFLICT(source_element_id, target_element_id) DO NOTHING",
        params![source_element_id, target_element_id],
    )?;
    Ok(changed == 1)
}
