use super::DocumentParser;

/// In-text reference `<<LINK Exercise 3.5.6>>`, unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMarker {
    pub kind: String,
    pub number: String,
}

impl LinkMarker {
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.number)
    }
}

impl DocumentParser {
    pub fn link_markers(&self, content: &str) -> Vec<LinkMarker> {
        self.link_marker
            .captures_iter(content)
            .filter_map(|captures| {
                Some(LinkMarker {
                    kind: captures.name("kind")?.as_str().to_string(),
                    number: captures.name("number")?.as_str().trim().to_string(),
                })
            })
            .collect()
    }
}
