use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::model::{Element, ElementKind, ElementLink, Section, Subsection, TableCounts};
use crate::parse::normalize_number;

const ELEMENT_COLUMNS: &str = "
    SELECT e.id, e.subsection_id, t.name, e.number, e.content
    FROM elements e
    JOIN element_types t ON t.id = e.type_id
";

fn element_from_row(row: &Row<'_>) -> rusqlite::Result<Element> {
    Ok(Element {
        id: row.get(0)?,
        subsection_id: row.get(1)?,
        kind: row.get(2)?,
        number: row.get(3)?,
        content: row.get(4)?,
    })
}

pub fn section_id(connection: &Connection, number: u32) -> Result<Option<i64>> {
    let id = connection
        .query_row("SELECT id FROM sections WHERE number = ?1", [number], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

pub fn subsection_id_at(
    connection: &Connection,
    section: u32,
    subsection: u32,
) -> Result<Option<i64>> {
    let id = connection
        .query_row(
            "
            SELECT ss.id
            FROM subsections ss
            JOIN sections s ON s.id = ss.section_id
            WHERE s.number = ?1 AND ss.number = ?2
            ",
            params![section, subsection],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn list_sections(connection: &Connection) -> Result<Vec<Section>> {
    let mut statement =
        connection.prepare("SELECT id, number, title FROM sections ORDER BY number")?;
    let sections = statement
        .query_map([], |row| {
            Ok(Section {
                id: row.get(0)?,
                number: row.get(1)?,
                title: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Section>>>()?;
    Ok(sections)
}

/// Subsection row together with its parent section's number.
pub fn get_subsection(connection: &Connection, subsection_id: i64) -> Result<Option<(u32, Subsection)>> {
    let found = connection
        .query_row(
            "
            SELECT s.number, ss.id, ss.section_id, ss.number, ss.title
            FROM subsections ss
            JOIN sections s ON s.id = ss.section_id
            WHERE ss.id = ?1
            ",
            [subsection_id],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    Subsection {
                        id: row.get(1)?,
                        section_id: row.get(2)?,
                        number: row.get(3)?,
                        title: row.get(4)?,
                    },
                ))
            },
        )
        .optional()?;
    Ok(found)
}

pub fn get_element(
    connection: &Connection,
    subsection_id: i64,
    kind: ElementKind,
    number: &str,
) -> Result<Option<Element>> {
    let sql = format!("{ELEMENT_COLUMNS} WHERE e.subsection_id = ?1 AND t.name = ?2 AND e.number = ?3");
    let element = connection
        .query_row(
            &sql,
            params![subsection_id, kind, normalize_number(number)],
            element_from_row,
        )
        .optional()?;
    Ok(element)
}

pub fn get_element_at(
    connection: &Connection,
    section: u32,
    subsection: u32,
    kind: ElementKind,
    number: &str,
) -> Result<Option<Element>> {
    match subsection_id_at(connection, section, subsection)? {
        Some(subsection_id) => get_element(connection, subsection_id, kind, number),
        None => Ok(None),
    }
}

/// Solution paired with `exercise`. The pairing is the shared (subsection, number) address,
/// so this is a fresh lookup; absence is `None`, not an error.
pub fn find_solution(connection: &Connection, exercise: &Element) -> Result<Option<Element>> {
    get_element(
        connection,
        exercise.subsection_id,
        ElementKind::Solution,
        &exercise.number,
    )
}

pub fn get_random_element(
    connection: &Connection,
    kind: ElementKind,
    excluding: &HashSet<i64>,
) -> Result<Option<Element>> {
    let mut excluded = excluding.iter().copied().collect::<Vec<i64>>();
    excluded.sort_unstable();

    let mut sql = format!("{ELEMENT_COLUMNS} WHERE t.name = ?1");
    if !excluded.is_empty() {
        let placeholders = (0..excluded.len())
            .map(|index| format!("?{}", index + 2))
            .collect::<Vec<String>>()
            .join(", ");
        sql.push_str(&format!(" AND e.id NOT IN ({placeholders})"));
    }
    sql.push_str(" ORDER BY RANDOM() LIMIT 1");

    let mut values = vec![Value::from(kind.as_str().to_string())];
    values.extend(excluded.into_iter().map(Value::from));

    let element = connection
        .query_row(&sql, params_from_iter(values), element_from_row)
        .optional()?;
    Ok(element)
}

/// Element count of one kind per section number. Every seeded section appears, with zero
/// when it holds none; totals are always recomputed from rows rather than kept as counters.
pub fn count_elements(connection: &Connection, kind: ElementKind) -> Result<BTreeMap<u32, i64>> {
    let mut statement = connection.prepare(
        "
        SELECT s.number, COUNT(e.id)
        FROM sections s
        LEFT JOIN subsections ss ON ss.section_id = s.id
        LEFT JOIN elements e
          ON e.subsection_id = ss.id
         AND e.type_id = (SELECT id FROM element_types WHERE name = ?1)
        GROUP BY s.number
        ORDER BY s.number
        ",
    )?;

    let rows = statement.query_map([kind], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?)))?;
    let mut counts = BTreeMap::new();
    for row in rows {
        let (section, count) = row?;
        counts.insert(section, count);
    }
    Ok(counts)
}

pub fn links_from(connection: &Connection, source_element_id: i64) -> Result<Vec<ElementLink>> {
    let mut statement = connection.prepare(
        "
        SELECT id, source_element_id, target_element_id
        FROM element_links
        WHERE source_element_id = ?1
        ORDER BY target_element_id
        ",
    )?;

    let links = statement
        .query_map([source_element_id], |row| {
            Ok(ElementLink {
                id: row.get(0)?,
                source_element_id: row.get(1)?,
                target_element_id: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<ElementLink>>>()?;
    Ok(links)
}

/// Elements whose content carries at least one LINK marker, in id order.
pub fn elements_with_links(connection: &Connection) -> Result<Vec<(i64, String)>> {
    let mut statement = connection.prepare(
        "SELECT id, content FROM elements WHERE instr(content, '<<LINK') > 0 ORDER BY id",
    )?;
    let rows = statement
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<(i64, String)>>>()?;
    Ok(rows)
}

pub fn table_counts(connection: &Connection) -> Result<TableCounts> {
    let count = |sql: &str| -> Result<i64> { Ok(connection.query_row(sql, [], |row| row.get(0))?) };

    Ok(TableCounts {
        sections: count("SELECT COUNT(*) FROM sections")?,
        subsections: count("SELECT COUNT(*) FROM subsections")?,
        element_types: count("SELECT COUNT(*) FROM element_types")?,
        elements: count("SELECT COUNT(*) FROM elements")?,
        element_links: count("SELECT COUNT(*) FROM element_links")?,
    })
}
