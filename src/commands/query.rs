use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::info;

use crate::cli::{QueryArgs, QueryTarget};
use crate::model::{Element, ElementKind, ElementLink};
use crate::store::{
    count_elements, find_solution, get_element_at, get_random_element, get_subsection,
    links_from, list_sections,
};

#[derive(Debug, Clone, Serialize)]
struct LocatedElement {
    section: u32,
    subsection: u32,
    subsection_title: String,
    #[serde(flatten)]
    element: Element,
}

#[derive(Debug, Clone, Serialize)]
struct SectionCount {
    section: u32,
    title: String,
    count: i64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "query", rename_all = "snake_case")]
enum QueryResponse {
    Element {
        kind: ElementKind,
        address: String,
        element: Option<LocatedElement>,
        #[serde(skip_serializing_if = "Option::is_none")]
        links: Option<Vec<ElementLink>>,
    },
    Solution {
        address: String,
        exercise: Option<LocatedElement>,
        solution: Option<LocatedElement>,
    },
    Random {
        kind: ElementKind,
        excluded: usize,
        element: Option<LocatedElement>,
    },
    Counts {
        kind: ElementKind,
        sections: Vec<SectionCount>,
    },
}

pub fn run(args: QueryArgs) -> Result<()> {
    let db_path = args.store.resolved_db_path();
    if !db_path.exists() {
        bail!(
            "content store not found at {}; run ingest first",
            db_path.display()
        );
    }

    let connection = Connection::open_with_flags(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;

    let response = answer(&connection, &args.target)?;
    info!(db_path = %db_path.display(), json = args.json, "query answered");

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn answer(connection: &Connection, target: &QueryTarget) -> Result<QueryResponse> {
    match target {
        QueryTarget::Element(address) => {
            let element = get_element_at(
                connection,
                address.section,
                address.subsection,
                address.kind,
                &address.number,
            )?;
            let links = match (&element, address.with_links) {
                (Some(element), true) => Some(links_from(connection, element.id)?),
                _ => None,
            };
            Ok(QueryResponse::Element {
                kind: address.kind,
                address: format!("{}.{}.{}", address.section, address.subsection, address.number),
                element: locate_optional(connection, element)?,
                links,
            })
        }
        QueryTarget::Solution(address) => {
            let exercise = get_element_at(
                connection,
                address.section,
                address.subsection,
                ElementKind::Exercise,
                &address.number,
            )?;
            let solution = match &exercise {
                Some(exercise) => find_solution(connection, exercise)?,
                None => None,
            };
            Ok(QueryResponse::Solution {
                address: format!("{}.{}.{}", address.section, address.subsection, address.number),
                exercise: locate_optional(connection, exercise)?,
                solution: locate_optional(connection, solution)?,
            })
        }
        QueryTarget::Random(random) => {
            let excluding = random.excluding.iter().copied().collect::<HashSet<i64>>();
            let element = get_random_element(connection, random.kind, &excluding)?;
            Ok(QueryResponse::Random {
                kind: random.kind,
                excluded: excluding.len(),
                element: locate_optional(connection, element)?,
            })
        }
        QueryTarget::Counts(counts) => {
            let per_section = count_elements(connection, counts.kind)?;
            Ok(QueryResponse::Counts {
                kind: counts.kind,
                sections: section_counts(connection, &per_section)?,
            })
        }
    }
}

fn locate_optional(connection: &Connection, element: Option<Element>) -> Result<Option<LocatedElement>> {
    let Some(element) = element else {
        return Ok(None);
    };
    let (section, subsection) = get_subsection(connection, element.subsection_id)?
        .with_context(|| format!("element {} points at a missing subsection", element.id))?;
    Ok(Some(LocatedElement {
        section,
        subsection: subsection.number,
        subsection_title: subsection.title,
        element,
    }))
}

fn section_counts(connection: &Connection, per_section: &BTreeMap<u32, i64>) -> Result<Vec<SectionCount>> {
    Ok(list_sections(connection)?
        .into_iter()
        .map(|section| SectionCount {
            count: per_section.get(&section.number).copied().unwrap_or(0),
            section: section.number,
            title: section.title,
        })
        .collect())
}

fn write_json_response(response: &QueryResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize query json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &QueryResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    match response {
        QueryResponse::Element {
            kind,
            address,
            element,
            links,
        } => {
            match element {
                Some(located) => write_element(&mut output, located)?,
                None => writeln!(output, "No {kind} at {address}")?,
            }
            if let Some(links) = links {
                writeln!(output, "Links: {}", links.len())?;
                for link in links {
                    writeln!(output, "\t-> element {}", link.target_element_id)?;
                }
            }
        }
        QueryResponse::Solution {
            address,
            exercise,
            solution,
        } => match (exercise, solution) {
            (None, _) => writeln!(output, "No exercise at {address}")?,
            (Some(exercise), None) => {
                write_element(&mut output, exercise)?;
                writeln!(output)?;
                writeln!(output, "No solution recorded for exercise {address}")?;
            }
            (Some(exercise), Some(solution)) => {
                write_element(&mut output, exercise)?;
                writeln!(output)?;
                write_element(&mut output, solution)?;
            }
        },
        QueryResponse::Random {
            kind,
            excluded,
            element,
        } => match element {
            Some(located) => write_element(&mut output, located)?,
            None => writeln!(output, "No {kind} left outside {excluded} excluded ids")?,
        },
        QueryResponse::Counts { kind, sections } => {
            writeln!(output, "Counts of {kind} per section")?;
            for entry in sections {
                writeln!(output, "{}.\t{}\t{}", entry.section, entry.title, entry.count)?;
            }
        }
    }

    output.flush()?;
    Ok(())
}

fn write_element(output: &mut impl Write, located: &LocatedElement) -> Result<()> {
    writeln!(
        output,
        "{} {}.{}.{}\t({})\tid={}",
        located.element.kind,
        located.section,
        located.subsection,
        located.element.number,
        located.subsection_title,
        located.element.id
    )?;
    writeln!(output, "{}", located.element.content)?;
    Ok(())
}
