use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Closed vocabulary of numbered content units. New kinds are added here, not discovered
/// from source documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Exercise,
    Solution,
    Theorem,
    Lemma,
    Corollary,
    Proposition,
    Definition,
    Example,
    Remark,
    Table,
    Figure,
}

impl ElementKind {
    pub const ALL: [ElementKind; 11] = [
        Self::Exercise,
        Self::Solution,
        Self::Theorem,
        Self::Lemma,
        Self::Corollary,
        Self::Proposition,
        Self::Definition,
        Self::Example,
        Self::Remark,
        Self::Table,
        Self::Figure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Solution => "solution",
            Self::Theorem => "theorem",
            Self::Lemma => "lemma",
            Self::Corollary => "corollary",
            Self::Proposition => "proposition",
            Self::Definition => "definition",
            Self::Example => "example",
            Self::Remark => "remark",
            Self::Table => "table",
            Self::Figure => "figure",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = IngestError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let lowered = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| IngestError::UnknownElementType {
                name: tag.trim().to_string(),
            })
    }
}

impl ToSql for ElementKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ElementKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: IngestError| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: i64,
    pub number: u32,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subsection {
    pub id: i64,
    pub section_id: i64,
    pub number: u32,
    pub title: String,
}

/// A numbered unit addressed by (subsection, kind, number). Exercises and their solutions
/// share subsection and number and are paired by that address alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub id: i64,
    pub subsection_id: i64,
    pub kind: ElementKind,
    pub number: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementLink {
    pub id: i64,
    pub source_element_id: i64,
    pub target_element_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionSeed {
    pub number: u32,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementTypeSeed {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub sections: i64,
    pub subsections: i64,
    pub element_types: i64,
    pub elements: i64,
    pub element_links: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub role: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub db_path: String,
    pub section_list: Option<String>,
    pub element_types_list: Option<String>,
    pub subsection_dir: Option<String>,
    pub solution_manual: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub sections_seeded: usize,
    pub element_types_seeded: usize,
    pub subsection_files_seen: usize,
    pub subsection_files_committed: usize,
    pub subsection_files_failed: usize,
    pub subsections_inserted: usize,
    pub elements_inserted: usize,
    pub elements_existing: usize,
    pub solutions_inserted: usize,
    pub solutions_existing: usize,
    pub solution_blocks_skipped: usize,
    pub links_inserted: usize,
    pub links_dangling: usize,
    pub totals: TableCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub source_hashes: Vec<SourceEntry>,
    pub failed_files: Vec<FailedFile>,
    pub warnings: Vec<String>,
}
