use anyhow::Result;
use rusqlite::{Connection, Transaction};
use tracing::info;

use crate::error::IngestError;
use crate::model::ElementKind;
use crate::parse::{DocumentParser, LinkMarker, split_qualified};
use crate::store::{add_link, elements_with_links, get_element_at};

use super::IngestStats;

#[derive(Debug, PartialEq, Eq)]
enum LinkResolution {
    Target(i64),
    Dangling(IngestError),
    Malformed(IngestError),
}

/// Cross-reference pass over every stored element carrying LINK markers. Runs after all
/// documents are in, so forward references inside one document resolve. Safe to repeat.
pub(crate) fn resolve_links(
    connection: &mut Connection,
    parser: &DocumentParser,
    stats: &mut IngestStats,
) -> Result<()> {
    let sources = elements_with_links(connection)?;
    let tx = connection.transaction()?;
    let mut markers_seen = 0usize;

    for (source_element_id, content) in &sources {
        let origin = format!("element {source_element_id}");
        for marker in parser.link_markers(content) {
            markers_seen += 1;
            match resolve_marker(&tx, *source_element_id, &marker)? {
                LinkResolution::Target(target_element_id) => {
                    if add_link(&tx, *source_element_id, target_element_id)? {
                        stats.counts.links_inserted += 1;
                    }
                }
                LinkResolution::Dangling(issue) => {
                    stats.counts.links_dangling += 1;
                    stats.warn(&origin, &issue);
                }
                LinkResolution::Malformed(issue) => {
                    stats.counts.links_dangling += 1;
                    stats.skip_record(&origin, &issue);
                }
            }
        }
    }

    tx.commit()?;
    info!(
        elements = sources.len(),
        markers = markers_seen,
        inserted = stats.counts.links_inserted,
        dangling = stats.counts.links_dangling,
        "link pass complete"
    );
    Ok(())
}

fn resolve_marker(
    tx: &Transaction<'_>,
    source_element_id: i64,
    marker: &LinkMarker,
) -> Result<LinkResolution> {
    let kind = match marker.kind.parse::<ElementKind>() {
        Ok(kind) => kind,
        Err(issue) => return Ok(LinkResolution::Dangling(issue)),
    };
    let address = match split_qualified(&marker.number) {
        Ok(address) => address,
        Err(issue) => return Ok(LinkResolution::Malformed(issue)),
    };

    let target = get_element_at(
        tx,
        address.section,
        address.subsection,
        kind,
        &address.number,
    )?;

    Ok(match target {
        Some(element) => LinkResolution::Target(element.id),
        None => LinkResolution::Dangling(IngestError::MissingReference {
            source_element_id,
            marker: marker.label(),
            reason: format!(
                "no {kind} {} in subsection {}.{}",
                address.number, address.section, address.subsection
            ),
        }),
    })
}
