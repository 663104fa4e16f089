use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::IngestRunManifest;
use crate::store::{metadata_value, table_counts};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.store.manifest_dir();
    let db_path = args.store.resolved_db_path();

    info!(cache_root = %args.store.cache_root.display(), "status requested");

    match latest_run_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: IngestRunManifest = read_json(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                failed_files = manifest.failed_files.len(),
                warnings = manifest.warnings.len(),
                links_dangling = manifest.counts.links_dangling,
                "loaded latest ingest run manifest"
            );
            for failed in &manifest.failed_files {
                warn!(path = %failed.path, reason = %failed.reason, "file failed in last run");
            }
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let schema_version = metadata_value(&conn, "db_schema_version")?.unwrap_or_default();
        let updated_at = metadata_value(&conn, "db_updated_at")?.unwrap_or_default();
        let counts = table_counts(&conn)?;

        info!(
            path = %db_path.display(),
            schema_version = %schema_version,
            updated_at = %updated_at,
            sections = counts.sections,
            subsections = counts.subsections,
            element_types = counts.element_types,
            elements = counts.elements,
            element_links = counts.element_links,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Newest `ingest_run_*.json` in `manifest_dir`. Run ids are compact UTC stamps, so the
/// lexicographically greatest name is the most recent run.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("ingest_run_") && name.ends_with(".json"))
            .unwrap_or(false);

        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::latest_run_manifest;

    #[test]
    fn latest_run_manifest_picks_newest_stamp() {
        let dir = TempDir::new().expect("temp dir should be created");
        for name in [
            "ingest_run_20260101T000000Z.json",
            "ingest_run_20260301T120000Z.json",
            "ingest_run_20260201T000000Z.json",
            "other.json",
        ] {
            fs::write(dir.path().join(name), "{}").expect("fixture should be written");
        }

        let latest = latest_run_manifest(dir.path())
            .expect("scan should succeed")
            .expect("a manifest should be found");
        assert!(latest.ends_with("ingest_run_20260301T120000Z.json"));
    }

    #[test]
    fn latest_run_manifest_handles_missing_directory() {
        let dir = TempDir::new().expect("temp dir should be created");
        let missing = dir.path().join("manifests");
        assert_eq!(latest_run_manifest(&missing).expect("scan should succeed"), None);
    }
}
