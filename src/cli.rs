use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::ElementKind;

#[derive(Parser, Debug)]
#[command(
    name = "textbook-index",
    version,
    about = "Local textbook and solution-manual ingestion and query tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Link(LinkArgs),
    Query(QueryArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(long, default_value = ".cache/textbook-index")]
    pub cache_root: PathBuf,

    #[arg(long, env = "DB_URL")]
    pub db_path: Option<PathBuf>,
}

impl StoreArgs {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.cache_root.join("content_store.sqlite"))
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.cache_root.join("manifests")
    }
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = "SECTION_LIST")]
    pub section_list: Option<PathBuf>,

    #[arg(long, env = "ELEMENT_TYPES_LIST")]
    pub element_types_list: Option<PathBuf>,

    #[arg(long = "subsection-dir", env = "SUBSECTION_FILES_DIR")]
    pub subsection_dir: Option<PathBuf>,

    #[arg(long, env = "SOLUTION_MANNUAL_FILE")]
    pub solution_manual: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_links: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub target: QueryTarget,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueryTarget {
    /// Element at a section.subsection address.
    Element(ElementAddressArgs),
    /// Solution paired with the exercise at an address.
    Solution(ExerciseAddressArgs),
    /// Random element of a kind, skipping the given ids.
    Random(RandomArgs),
    /// Element counts of a kind per section.
    Counts(CountsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ElementAddressArgs {
    #[arg(long)]
    pub section: u32,

    #[arg(long)]
    pub subsection: u32,

    #[arg(long = "type", value_parser = parse_kind)]
    pub kind: ElementKind,

    #[arg(long)]
    pub number: String,

    #[arg(long, default_value_t = false)]
    pub with_links: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExerciseAddressArgs {
    #[arg(long)]
    pub section: u32,

    #[arg(long)]
    pub subsection: u32,

    #[arg(long)]
    pub number: String,
}

#[derive(Args, Debug, Clone)]
pub struct RandomArgs {
    #[arg(long = "type", value_parser = parse_kind, default_value = "exercise")]
    pub kind: ElementKind,

    #[arg(long = "exclude", value_delimiter = ',')]
    pub excluding: Vec<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct CountsArgs {
    #[arg(long = "type", value_parser = parse_kind, default_value = "exercise")]
    pub kind: ElementKind,
}

fn parse_kind(raw: &str) -> Result<ElementKind, String> {
    raw.parse().map_err(|err: crate::error::IngestError| err.to_string())
}
