use super::DocumentParser;

/// Heading line that names a subsection: `# 3.5 Conditional Probability`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLine {
    pub raw_number: String,
    pub title: String,
}

/// A per-subsection source file split into its title line and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsectionSource<'a> {
    pub title_line: &'a str,
    pub body: &'a str,
}

impl SubsectionSource<'_> {
    pub fn split(text: &str) -> Option<SubsectionSource<'_>> {
        let start = text.len() - text.trim_start().len();
        let rest = &text[start..];
        if rest.is_empty() {
            return None;
        }

        let (title_line, body) = match rest.find('\n') {
            Some(index) => (&rest[..index], &rest[index + 1..]),
            None => (rest, ""),
        };

        Some(SubsectionSource {
            title_line: title_line.trim_end_matches('\r'),
            body,
        })
    }
}

impl DocumentParser {
    pub fn parse_title(&self, line: &str) -> Option<TitleLine> {
        let captures = self.title_line.captures(line.trim())?;
        let raw_number = captures.name("number")?.as_str().trim().to_string();
        let title = captures
            .name("title")
            .map(|value| value.as_str().trim().to_string())
            .unwrap_or_default();

        Some(TitleLine { raw_number, title })
    }

    /// Subsection heading inside the solution manual. Unlike [`Self::parse_title`] both number
    /// groups are required, and a title opening in lowercase is prose that OCR turned into a
    /// heading rather than a real subsection.
    pub(super) fn detect_manual_heading(&self, line: &str) -> Option<TitleLine> {
        let captures = self.manual_heading.captures(line.trim())?;
        let raw_number = captures.name("number")?.as_str().trim().to_string();
        let title = captures
            .name("title")
            .map(|value| value.as_str().trim())
            .unwrap_or_default();

        if title.chars().next().is_none_or(char::is_lowercase) {
            return None;
        }

        Some(TitleLine {
            raw_number,
            title: title.to_string(),
        })
    }
}
