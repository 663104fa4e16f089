use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::model::{ElementKind, ElementTypeSeed, SectionSeed};
use crate::store::{seed_element_type, seed_section};
use crate::util::read_json;

use super::IngestStats;

/// Pre-populates sections and element types from their JSON seed lists in one
/// transaction. Rows whose natural key already exists are left alone. An unreadable list is
/// recorded as a failed file and the run carries on with what the store already holds.
pub(super) fn seed_reference_tables(
    connection: &mut Connection,
    section_list: Option<&Path>,
    element_types_list: Option<&Path>,
    stats: &mut IngestStats,
) -> Result<()> {
    let sections = section_list.and_then(|path| {
        load_seed_list::<SectionSeed>(path, "section_list", stats).map(|seeds| (path, seeds))
    });
    let element_types = element_types_list.and_then(|path| {
        load_seed_list::<ElementTypeSeed>(path, "element_types_list", stats).map(|seeds| (path, seeds))
    });

    let tx = connection.transaction()?;

    if let Some((path, seeds)) = sections {
        let mut inserted = 0usize;
        for seed in &seeds {
            if seed_section(&tx, seed)? {
                inserted += 1;
            }
        }
        stats.counts.sections_seeded += inserted;
        info!(path = %path.display(), listed = seeds.len(), inserted, "seeded sections");
    }

    if let Some((path, seeds)) = element_types {
        let origin = path.display().to_string();
        let mut inserted = 0usize;
        for seed in &seeds {
            match seed.name.parse::<ElementKind>() {
                Ok(kind) => {
                    if seed_element_type(&tx, kind)? {
                        inserted += 1;
                    }
                }
                Err(issue) => stats.warn(&origin, &issue),
            }
        }
        stats.counts.element_types_seeded += inserted;
        info!(path = %path.display(), listed = seeds.len(), inserted, "seeded element types");
    }

    tx.commit()?;
    Ok(())
}

fn load_seed_list<T: DeserializeOwned>(
    path: &Path,
    role: &str,
    stats: &mut IngestStats,
) -> Option<Vec<T>> {
    let loaded = stats
        .record_source(path, role)
        .and_then(|()| read_json::<Vec<T>>(path));

    match loaded {
        Ok(seeds) => Some(seeds),
        Err(err) => {
            stats.fail_file(path, &err);
            None
        }
    }
}
