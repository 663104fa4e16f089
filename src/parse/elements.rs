use std::collections::HashSet;

use crate::error::IngestError;

use super::DocumentParser;

/// A `<<TYPE NUMBER>> ... <</TYPE NUMBER>>` span. `kind` and `number` are the raw tokens
/// exactly as they appeared in both markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    pub kind: String,
    pub number: String,
    pub content: String,
    pub offset: usize,
}

#[derive(Debug, Default)]
pub struct ParsedElements {
    pub spans: Vec<ElementSpan>,
    pub warnings: Vec<IngestError>,
}

#[derive(Debug)]
struct Marker<'a> {
    closing: bool,
    kind: &'a str,
    number: &'a str,
    start: usize,
    end: usize,
}

impl Marker<'_> {
    fn same_key(&self, other: &Marker<'_>) -> bool {
        self.kind == other.kind && self.number == other.number
    }

    fn label(&self) -> String {
        format!("{} {}", self.kind, self.number)
    }
}

impl DocumentParser {
    /// Pairs opening and closing markers. A span exists only when both markers carry
    /// byte-identical type and number tokens; anything in between, including other spans,
    /// belongs to its content.
    pub fn parse_elements(&self, text: &str) -> ParsedElements {
        let markers = self.collect_markers(text);
        let mut parsed = ParsedElements::default();
        let mut reported_closers = HashSet::<usize>::new();
        let mut index = 0usize;

        while index < markers.len() {
            let marker = &markers[index];

            if marker.closing {
                if !reported_closers.contains(&index) {
                    parsed.warnings.push(IngestError::StrayClosingMarker {
                        marker: marker.label(),
                    });
                }
                index += 1;
                continue;
            }

            let closer = markers
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, candidate)| candidate.closing && candidate.same_key(marker))
                .map(|(position, _)| position);

            let Some(closer) = closer else {
                let next_closer = markers
                    .iter()
                    .enumerate()
                    .skip(index + 1)
                    .find(|(_, candidate)| candidate.closing);
                if let Some((position, _)) = next_closer {
                    reported_closers.insert(position);
                }
                parsed.warnings.push(IngestError::ParseMismatch {
                    opened: marker.label(),
                    closed: next_closer.map(|(_, candidate)| candidate.label()),
                });
                index += 1;
                continue;
            };

            let mut opener = index;
            for position in index + 1..closer {
                let candidate = &markers[position];
                if !candidate.closing && candidate.same_key(marker) {
                    opener = position;
                }
            }
            if opener != index {
                parsed.warnings.push(IngestError::OverlappingSpan {
                    marker: marker.label(),
                });
            }

            let open = &markers[opener];
            let close = &markers[closer];
            parsed.spans.push(ElementSpan {
                kind: open.kind.to_string(),
                number: open.number.to_string(),
                content: text[open.end..close.start].to_string(),
                offset: open.start,
            });
            index = closer + 1;
        }

        parsed
    }

    fn collect_markers<'a>(&self, text: &'a str) -> Vec<Marker<'a>> {
        self.element_marker
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let kind = captures.name("kind")?.as_str();
                if kind.eq_ignore_ascii_case("LINK") {
                    return None;
                }

                Some(Marker {
                    closing: captures.name("close").is_some(),
                    kind,
                    number: captures.name("number")?.as_str(),
                    start: whole.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }
}

/// Strips formatting debris left by OCR: heading hashes at line starts, trailing whitespace
/// and runs of blank lines. LINK markers survive untouched.
pub fn clean_content(raw: &str) -> String {
    let mut lines = Vec::<&str>::new();
    let mut previous_blank = false;

    for line in raw.lines() {
        let line = strip_heading_marker(line).trim_end();
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(if blank { "" } else { line });
    }

    lines.join("\n").trim().to_string()
}

fn strip_heading_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        trimmed.trim_start_matches('#').trim_start()
    } else {
        line
    }
}
