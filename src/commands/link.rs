use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::LinkArgs;
use crate::commands::ingest::{IngestStats, resolve_links};
use crate::parse::DocumentParser;
use crate::store::{self, table_counts};

pub fn run(args: LinkArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    if !db_path.exists() {
        bail!(
            "content store not found at {}; run ingest first",
            db_path.display()
        );
    }

    let mut connection = store::open(&db_path)?;
    let parser = DocumentParser::new()?;
    let mut stats = IngestStats::default();
    resolve_links(&mut connection, &parser, &mut stats)?;

    if stats.counts.links_dangling > 0 {
        warn!(
            dangling = stats.counts.links_dangling,
            "some references did not resolve; re-run after ingesting their targets"
        );
    }

    let totals = table_counts(&connection)?;
    info!(
        db_path = %db_path.display(),
        inserted = stats.counts.links_inserted,
        element_links = totals.element_links,
        "link command completed"
    );
    Ok(())
}
