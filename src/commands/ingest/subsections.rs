use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};
use tracing::{debug, info};

use crate::error::IngestError;
use crate::model::ElementKind;
use crate::parse::{DocumentParser, SubsectionSource, element_number, split_compound};
use crate::store::{SubsectionRef, add_element, upsert_subsection};
use crate::util::read_text;

use super::IngestStats;

/// Counters for one subsection file, merged into the run only once its transaction commits.
#[derive(Debug, Default)]
pub(super) struct FileOutcome {
    pub(super) section: u32,
    pub(super) subsection: u32,
    pub(super) subsection_created: bool,
    pub(super) elements_inserted: usize,
    pub(super) elements_existing: usize,
    pub(super) warnings: Vec<IngestError>,
}

pub(super) fn discover_markdown_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let entries = fs::read_dir(directory)
        .with_context(|| format!("failed to read {}", directory.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", directory.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_markdown = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
            .unwrap_or(false);

        if is_markdown {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Ingests every subsection file in `directory`, one transaction per file. A file that fails
/// is rolled back and recorded; the remaining files still run.
pub(super) fn ingest_subsection_dir(
    connection: &mut Connection,
    directory: &Path,
    parser: &DocumentParser,
    stats: &mut IngestStats,
) -> Result<()> {
    let files = discover_markdown_files(directory)?;
    info!(directory = %directory.display(), files = files.len(), "ingesting subsection files");

    for path in files {
        stats.counts.subsection_files_seen += 1;

        if let Err(err) = stats.record_source(&path, "subsection") {
            stats.counts.subsection_files_failed += 1;
            stats.fail_file(&path, &err);
            continue;
        }

        let tx = connection.transaction()?;
        match ingest_subsection_file(&tx, &path, parser) {
            Ok(outcome) => {
                tx.commit()
                    .with_context(|| format!("failed to commit {}", path.display()))?;
                merge_outcome(stats, &path, outcome);
            }
            Err(err) => {
                tx.rollback()?;
                stats.counts.subsection_files_failed += 1;
                stats.fail_file(&path, &err);
            }
        }
    }

    Ok(())
}

pub(super) fn ingest_subsection_file(
    tx: &Transaction<'_>,
    path: &Path,
    parser: &DocumentParser,
) -> Result<FileOutcome> {
    let text = read_text(path)?;
    let source = SubsectionSource::split(&text)
        .with_context(|| format!("{} is empty", path.display()))?;
    let heading = parser
        .parse_title(source.title_line)
        .with_context(|| format!("unrecognized title line: {:?}", source.title_line))?;
    let (section, subsection) = split_compound(&heading.raw_number)?;

    let upsert = upsert_subsection(tx, section, subsection, &heading.title)
        .with_context(|| format!("failed to store subsection {section}.{subsection}"))?;

    let parsed = parser.parse_elements(source.body);
    let mut outcome = FileOutcome {
        section,
        subsection,
        subsection_created: upsert.created,
        warnings: parsed.warnings,
        ..FileOutcome::default()
    };

    for span in parsed.spans {
        let kind = match span.kind.parse::<ElementKind>() {
            Ok(kind) => kind,
            Err(issue) => {
                outcome.warnings.push(issue);
                continue;
            }
        };
        let number = element_number(&span.number, section, subsection);

        let inserted = add_element(
            tx,
            SubsectionRef::Id(upsert.id),
            kind,
            &number,
            &span.content,
        )
        .with_context(|| format!("failed to store {kind} {number} at offset {}", span.offset))?;

        if inserted {
            outcome.elements_inserted += 1;
        } else {
            debug!(element_type = %kind, number = %number, "element already stored");
            outcome.elements_existing += 1;
        }
    }

    Ok(outcome)
}

fn merge_outcome(stats: &mut IngestStats, path: &Path, outcome: FileOutcome) {
    let origin = path.display().to_string();
    for issue in &outcome.warnings {
        stats.warn(&origin, issue);
    }

    let counts = &mut stats.counts;
    counts.subsection_files_committed += 1;
    if outcome.subsection_created {
        counts.subsections_inserted += 1;
    }
    counts.elements_inserted += outcome.elements_inserted;
    counts.elements_existing += outcome.elements_existing;

    info!(
        path = %path.display(),
        section = outcome.section,
        subsection = outcome.subsection,
        inserted = outcome.elements_inserted,
        existing = outcome.elements_existing,
        "subsection committed"
    );
}
