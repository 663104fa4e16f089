//! Grammars for the OCR-derived textbook and solution manual.
//!
//! Everything here is pure text processing; nothing touches the store.

mod elements;
mod links;
mod manual;
mod number;
mod title;

use anyhow::{Context, Result};
use regex::Regex;

pub use elements::{ElementSpan, ParsedElements, clean_content};
pub use links::LinkMarker;
pub use manual::{ManualEntry, ManualSubsection, ParsedManual};
pub use number::{
    QualifiedNumber, element_number, normalize_number, split_compound, split_qualified,
};
pub use title::{SubsectionSource, TitleLine};

#[derive(Debug)]
pub struct DocumentParser {
    title_line: Regex,
    element_marker: Regex,
    link_marker: Regex,
    manual_heading: Regex,
    chapter_heading: Regex,
    exercises_heading: Regex,
    list_item: Regex,
}

impl DocumentParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title_line: Regex::new(
                r"^#+[ \t*]*(?P<number>[0-9IO]+(?:[ \t]*\.[ \t]*[0-9IO]+|[ \t]+[0-9IO]+)?)\b[ \t.]*(?P<title>.*?)[ \t*]*$",
            )
            .context("failed to compile title line regex")?,
            element_marker: Regex::new(
                r"<<(?P<close>/)?[ \t]*(?P<kind>[A-Za-z]+)[ \t]+(?P<number>[0-9IO][0-9IO.]*)[ \t]*>>",
            )
            .context("failed to compile element marker regex")?,
            link_marker: Regex::new(
                r"<<LINK[ \t]+(?P<kind>[A-Za-z]+)[ \t]+(?P<number>[0-9IO][0-9IO. \t]*?)[ \t]*>>",
            )
            .context("failed to compile link marker regex")?,
            manual_heading: Regex::new(
                r"^#+[ \t*]*(?P<number>[0-9IO]+(?:[ \t]*\.[ \t]*|[ \t]+)[0-9IO]+)\b[ \t.]*(?P<title>.*?)[ \t*]*$",
            )
            .context("failed to compile manual subsection heading regex")?,
            chapter_heading: Regex::new(r"(?i)^#+[ \t*]*chapter[ \t]+[0-9IO]+[ \t*]*$")
                .context("failed to compile chapter heading regex")?,
            exercises_heading: Regex::new(
                r"(?i)^#+[ \t*]*(?:solutions[ \t]+to[ \t]+)?exercises[ \t*:]*$",
            )
            .context("failed to compile exercises heading regex")?,
            list_item: Regex::new(r"^#*[ \t]*(?P<number>\d+)\.(?:[ \t]+(?P<body>.*))?$")
                .context("failed to compile exercise list item regex")?,
        })
    }
}
