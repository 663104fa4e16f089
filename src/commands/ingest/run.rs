use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::IngestArgs;
use crate::model::{IngestPaths, IngestRunManifest};
use crate::parse::DocumentParser;
use crate::store::{self, DB_SCHEMA_VERSION, table_counts};
use crate::util::{compact_stamp, ensure_dir, rfc3339_now, write_json_pretty};

use super::{
    IngestStats, ingest_solution_manual, ingest_subsection_dir, resolve_links,
    seed_reference_tables,
};

/// Inputs of one ingestion run. Every document is optional so a later run can add the
/// solution manual to a store that already holds the textbook.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct IngestSources<'a> {
    pub(super) section_list: Option<&'a Path>,
    pub(super) element_types_list: Option<&'a Path>,
    pub(super) subsection_dir: Option<&'a Path>,
    pub(super) solution_manual: Option<&'a Path>,
    pub(super) resolve_links: bool,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = rfc3339_now();
    let stamp = compact_stamp(started_ts);
    let run_id = format!("run-{stamp}");

    let cache_root = args.store.cache_root.clone();
    let manifest_dir = args.store.manifest_dir();
    ensure_dir(&manifest_dir)?;

    let ingest_manifest_path = args
        .ingest_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join(format!("ingest_run_{stamp}.json")));
    let db_path = args.store.resolved_db_path();

    info!(db_path = %db_path.display(), run_id = %run_id, "starting ingest");

    let mut connection = store::open(&db_path)?;
    let sources = IngestSources {
        section_list: args.section_list.as_deref(),
        element_types_list: args.element_types_list.as_deref(),
        subsection_dir: args.subsection_dir.as_deref(),
        solution_manual: args.solution_manual.as_deref(),
        resolve_links: !args.skip_links,
    };
    let mut stats = ingest_sources(&mut connection, &sources)?;
    stats.counts.totals = table_counts(&connection)?;

    let status = if stats.failed_files.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: rfc3339_now(),
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            db_path: db_path.display().to_string(),
            section_list: display_optional(sources.section_list),
            element_types_list: display_optional(sources.element_types_list),
            subsection_dir: display_optional(sources.subsection_dir),
            solution_manual: display_optional(sources.solution_manual),
        },
        counts: stats.counts.clone(),
        source_hashes: stats.sources,
        failed_files: stats.failed_files,
        warnings: stats.warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), status, "wrote ingest run manifest");
    info!(
        sections = manifest.counts.totals.sections,
        subsections = manifest.counts.totals.subsections,
        elements = manifest.counts.totals.elements,
        element_links = manifest.counts.totals.element_links,
        "ingest completed"
    );

    Ok(())
}

/// Seeds, subsection files, solution manual, then the link pass. Per-file failures are
/// recorded in the returned stats; only store-level errors propagate.
pub(super) fn ingest_sources(
    connection: &mut Connection,
    sources: &IngestSources<'_>,
) -> Result<IngestStats> {
    let parser = DocumentParser::new()?;
    let mut stats = IngestStats::default();

    seed_reference_tables(
        connection,
        sources.section_list,
        sources.element_types_list,
        &mut stats,
    )?;

    match sources.subsection_dir {
        Some(directory) => ingest_subsection_dir(connection, directory, &parser, &mut stats)?,
        None => warn!("no subsection directory configured; skipping textbook files"),
    }

    match sources.solution_manual {
        Some(path) => ingest_solution_manual(connection, path, &parser, &mut stats)?,
        None => warn!("no solution manual configured; skipping solutions"),
    }

    if sources.resolve_links {
        resolve_links(connection, &parser, &mut stats)?;
    }

    Ok(stats)
}

fn display_optional(path: Option<&Path>) -> Option<String> {
    path.map(|path| path.display().to_string())
}
