use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};
use tracing::{info, warn};

use crate::model::ElementKind;
use crate::parse::{DocumentParser, split_compound};
use crate::store::{SubsectionRef, add_element};
use crate::util::read_text;

use super::IngestStats;

/// Ingests the solution manual as one transaction. Every numbered entry becomes a solution
/// at the same (section, subsection, number) address its exercise uses. A missing section
/// or subsection rolls the whole file back.
pub(super) fn ingest_solution_manual(
    connection: &mut Connection,
    path: &Path,
    parser: &DocumentParser,
    stats: &mut IngestStats,
) -> Result<()> {
    if let Err(err) = stats.record_source(path, "solution_manual") {
        stats.fail_file(path, &err);
        return Ok(());
    }

    let tx = connection.transaction()?;
    let mut pending = IngestStats::default();
    match store_manual(&tx, path, parser, &mut pending) {
        Ok(()) => {
            tx.commit()
                .with_context(|| format!("failed to commit {}", path.display()))?;
            stats.counts.solutions_inserted += pending.counts.solutions_inserted;
            stats.counts.solutions_existing += pending.counts.solutions_existing;
            stats.counts.solution_blocks_skipped += pending.counts.solution_blocks_skipped;
            stats.warnings.extend(pending.warnings);
            info!(
                path = %path.display(),
                inserted = pending.counts.solutions_inserted,
                existing = pending.counts.solutions_existing,
                "solution manual committed"
            );
        }
        Err(err) => {
            tx.rollback()?;
            stats.fail_file(path, &err);
        }
    }

    Ok(())
}

fn store_manual(
    tx: &Transaction<'_>,
    path: &Path,
    parser: &DocumentParser,
    stats: &mut IngestStats,
) -> Result<()> {
    let text = read_text(path)?;
    let manual = parser.parse_solution_manual(&text);
    info!(
        path = %path.display(),
        subsections = manual.subsections.len(),
        "parsed solution manual"
    );

    for block in manual.subsections {
        let origin = format!("{}:{}", path.display(), block.line);
        let (section, subsection) = match split_compound(&block.heading.raw_number) {
            Ok(address) => address,
            Err(issue) => {
                stats.skip_record(&origin, &issue);
                stats.counts.solution_blocks_skipped += 1;
                continue;
            }
        };

        for issue in &block.warnings {
            stats.warn(&origin, issue);
        }

        if block.entries.is_empty() {
            warn!(origin = %origin, section, subsection, "no exercise block found");
            continue;
        }

        for entry in block.entries {
            if entry.content.is_empty() {
                warn!(origin = %origin, number = entry.number, "empty solution entry");
                stats
                    .warnings
                    .push(format!("{origin}: empty solution {section}.{subsection}.{}", entry.number));
                continue;
            }

            let inserted = add_element(
                tx,
                SubsectionRef::Address {
                    section,
                    subsection,
                },
                ElementKind::Solution,
                &entry.number.to_string(),
                &entry.content,
            )
            .with_context(|| {
                format!(
                    "failed to store solution {section}.{subsection}.{} from line {}",
                    entry.number, block.line
                )
            })?;

            if inserted {
                stats.counts.solutions_inserted += 1;
            } else {
                stats.counts.solutions_existing += 1;
            }
        }
    }

    Ok(())
}
