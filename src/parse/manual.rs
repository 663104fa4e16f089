use crate::error::IngestError;

use super::{DocumentParser, TitleLine};

/// One numbered solution inside a subsection's exercise block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub number: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSubsection {
    pub heading: TitleLine,
    pub line: usize,
    pub entries: Vec<ManualEntry>,
    pub warnings: Vec<IngestError>,
}

#[derive(Debug, Default)]
pub struct ParsedManual {
    pub subsections: Vec<ManualSubsection>,
}

#[derive(Debug)]
struct ActiveBlock<'a> {
    heading: TitleLine,
    line: usize,
    body: Vec<&'a str>,
}

impl DocumentParser {
    pub fn parse_solution_manual(&self, text: &str) -> ParsedManual {
        let mut parsed = ParsedManual::default();
        let mut current: Option<ActiveBlock<'_>> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim_end_matches('\r');

            if let Some(heading) = self.detect_manual_heading(line) {
                if let Some(active) = current.take() {
                    parsed.subsections.push(self.finalize_block(active));
                }
                current = Some(ActiveBlock {
                    heading,
                    line: index + 1,
                    body: Vec::new(),
                });
                continue;
            }

            if self.chapter_heading.is_match(line.trim()) {
                if let Some(active) = current.take() {
                    parsed.subsections.push(self.finalize_block(active));
                }
                continue;
            }

            if let Some(active) = current.as_mut() {
                active.body.push(line);
            }
        }

        if let Some(active) = current.take() {
            parsed.subsections.push(self.finalize_block(active));
        }

        parsed
    }

    fn finalize_block(&self, active: ActiveBlock<'_>) -> ManualSubsection {
        let block = self.exercise_block(&active.heading.title, &active.body);
        let (entries, warnings) = self.split_entries(block);
        ManualSubsection {
            heading: active.heading,
            line: active.line,
            entries,
            warnings,
        }
    }

    /// Trailing list of solutions for a subsection. An explicit heading wins; a subsection
    /// titled "Exercises" is all list; otherwise the list opens at the first item not
    /// introduced by prose ending in `.`, `:` or `$` within one blank line.
    fn exercise_block<'a, 'b>(&self, title: &str, body: &'b [&'a str]) -> &'b [&'a str] {
        if title.to_ascii_lowercase().contains("exercises") {
            return body;
        }

        if let Some(position) = body
            .iter()
            .position(|line| self.exercises_heading.is_match(line.trim()))
        {
            return &body[position + 1..];
        }

        let mut introducer: Option<&str> = None;
        let mut blanks_since = 0usize;
        for (position, line) in body.iter().enumerate() {
            if line.trim().is_empty() {
                blanks_since += 1;
                continue;
            }

            if self.list_item.is_match(line.trim_start()) {
                let introduced = blanks_since <= 1
                    && introducer.is_some_and(|text| text.ends_with(['.', ':', '$']));
                if !introduced {
                    return &body[position..];
                }
            } else {
                introducer = Some(line.trim_end());
            }
            blanks_since = 0;
        }

        &[]
    }

    /// Every `N.` line opens a new entry. Numbers that repeat or run backwards are kept
    /// and reported; the store keeps the first entry at each address.
    fn split_entries(&self, block: &[&str]) -> (Vec<ManualEntry>, Vec<IngestError>) {
        let mut entries = Vec::<ManualEntry>::new();
        let mut warnings = Vec::<IngestError>::new();
        let mut current: Option<(u32, Vec<&str>)> = None;
        let mut highest: Option<u32> = None;

        for &line in block {
            let item = self.list_item.captures(line.trim_start()).and_then(|captures| {
                let number = captures.name("number")?.as_str().parse::<u32>().ok()?;
                let body = captures.name("body").map(|value| value.as_str()).unwrap_or("");
                Some((number, body))
            });

            let Some((number, first)) = item else {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
                continue;
            };

            if let Some(previous) = highest.filter(|previous| number <= *previous) {
                warnings.push(IngestError::EntryOutOfOrder { previous, number });
            }
            highest = highest.max(Some(number));

            if let Some((open, lines)) = current.take() {
                entries.push(finish_entry(open, &lines));
            }
            current = Some((number, vec![first]));
        }

        if let Some((open, lines)) = current.take() {
            entries.push(finish_entry(open, &lines));
        }

        (entries, warnings)
    }
}

fn finish_entry(number: u32, lines: &[&str]) -> ManualEntry {
    ManualEntry {
        number,
        content: lines.join("\n").trim().to_string(),
    }
}
